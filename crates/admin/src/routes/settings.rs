//! Site settings shown in the storefront header and footer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use iranmarket_core::settings::SiteSettings;

use crate::db::SiteSettingRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireEditor;
use crate::middleware::flash;
use crate::routes::context::PageContext;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub ctx: PageContext,
    pub settings: SiteSettings,
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub intro_text: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub whatsapp_link: String,
    #[serde(default)]
    pub instagram_link: String,
    #[serde(default)]
    pub delivery_description: String,
}

impl SettingsForm {
    /// A blank store name keeps the current one.
    fn apply(self, current: &SiteSettings) -> SiteSettings {
        let store_name = self.store_name.trim();
        SiteSettings {
            store_name: if store_name.is_empty() {
                current.store_name.clone()
            } else {
                store_name.to_owned()
            },
            intro_text: self.intro_text.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            whatsapp_link: self.whatsapp_link.trim().to_owned(),
            instagram_link: self.instagram_link.trim().to_owned(),
            delivery_description: self.delivery_description.trim().to_owned(),
        }
    }
}

#[instrument(skip(state, ctx))]
pub async fn show(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let settings = SiteSettingRepository::new(state.pool())
        .get_or_default()
        .await?;
    Ok(SettingsTemplate { ctx, settings })
}

#[instrument(skip(state, session, form))]
pub async fn save(
    State(state): State<AppState>,
    session: Session,
    RequireEditor(_admin): RequireEditor,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect> {
    let repo = SiteSettingRepository::new(state.pool());
    let settings = form.apply(&repo.get_or_default().await?);
    repo.save(&settings).await?;
    info!("site settings saved");
    flash::success(&session, "تنظیمات سایت ذخیره شد.").await;
    Ok(Redirect::to("/settings"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_store_name_is_kept() {
        let current = SiteSettings {
            store_name: "ایران مارکت".to_owned(),
            ..SiteSettings::default()
        };
        let form = SettingsForm {
            store_name: "  ".to_owned(),
            intro_text: " خرید آنلاین ".to_owned(),
            phone: String::new(),
            address: String::new(),
            whatsapp_link: String::new(),
            instagram_link: String::new(),
            delivery_description: String::new(),
        };
        let settings = form.apply(&current);
        assert_eq!(settings.store_name, "ایران مارکت");
        assert_eq!(settings.intro_text, "خرید آنلاین");
    }
}
