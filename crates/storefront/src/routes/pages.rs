//! Static help pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::routes::context::PageContext;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
}

/// Buying guide template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/buying_guide.html")]
pub struct BuyingGuideTemplate {
    pub ctx: PageContext,
}

/// Shipping methods template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/shipping_methods.html")]
pub struct ShippingMethodsTemplate {
    pub ctx: PageContext,
}

/// Return policy template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/return_policy.html")]
pub struct ReturnPolicyTemplate {
    pub ctx: PageContext,
}

/// A question and its answer on the FAQ page.
#[derive(Debug, Clone, Copy)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

/// FAQ template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub ctx: PageContext,
    pub entries: Vec<FaqEntry>,
}

const FAQ: &[FaqEntry] = &[
    FaqEntry {
        question: "چطور وارد حساب کاربری شوم؟",
        answer: "شماره موبایل یا ایمیل خود را وارد کنید تا کد ورود یک‌بار مصرف برایتان ارسال شود.",
    },
    FaqEntry {
        question: "هزینه ارسال چطور محاسبه می‌شود؟",
        answer: "هزینه ارسال به منطقه شهر انتخاب‌شده بستگی دارد و برای سفارش‌های بالاتر از سقف تعیین‌شده رایگان است.",
    },
    FaqEntry {
        question: "آیا می‌توانم سفارشم را لغو کنم؟",
        answer: "تا پیش از پرداخت و ارسال، از صفحه جزئیات سفارش در حساب کاربری می‌توانید آن را لغو کنید.",
    },
    FaqEntry {
        question: "چطور از کد تخفیف استفاده کنم؟",
        answer: "کد تخفیف را در صفحه تکمیل خرید وارد کنید؛ مبلغ تخفیف پیش از پرداخت نمایش داده می‌شود.",
    },
];

/// Display the about page.
#[instrument(skip(ctx))]
pub async fn about(ctx: PageContext) -> impl IntoResponse {
    AboutTemplate { ctx }
}

/// Display the buying guide.
#[instrument(skip(ctx))]
pub async fn buying_guide(ctx: PageContext) -> impl IntoResponse {
    BuyingGuideTemplate { ctx }
}

/// Display the shipping methods page.
#[instrument(skip(ctx))]
pub async fn shipping_methods(ctx: PageContext) -> impl IntoResponse {
    ShippingMethodsTemplate { ctx }
}

/// Display the return policy.
#[instrument(skip(ctx))]
pub async fn return_policy(ctx: PageContext) -> impl IntoResponse {
    ReturnPolicyTemplate { ctx }
}

/// Display the FAQ.
#[instrument(skip(ctx))]
pub async fn faq(ctx: PageContext) -> impl IntoResponse {
    FaqTemplate {
        ctx,
        entries: FAQ.to_vec(),
    }
}
