//! Store-wide settings edited from the admin panel.

use serde::{Deserialize, Serialize};

/// Contact details and copy shown in the storefront header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub store_name: String,
    pub intro_text: String,
    pub phone: String,
    pub address: String,
    pub whatsapp_link: String,
    pub instagram_link: String,
    pub delivery_description: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            store_name: "ایران مارکت".to_owned(),
            intro_text: String::new(),
            phone: String::new(),
            address: String::new(),
            whatsapp_link: String::new(),
            instagram_link: String::new(),
            delivery_description: String::new(),
        }
    }
}
