//! Status and kind enums stored as Postgres enum types.

use serde::{Deserialize, Serialize};

/// Parse failure for any of the enums in this module.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Generates `as_str`, `ALL`, `Display` and `FromStr` from one table of
/// variant/string pairs.
macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable machine name (also the database label).
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError::new($kind, s)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, waiting for payment.
    #[default]
    Pending,
    /// Paid and being packed.
    Processing,
    /// Handed to the courier.
    Sent,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Processing => "processing",
    Sent => "sent",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Customer-facing Persian label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "در انتظار پرداخت",
            Self::Processing => "در حال پردازش",
            Self::Sent => "ارسال شده",
            Self::Delivered => "تحویل داده شده",
            Self::Cancelled => "لغو شده",
        }
    }

    /// Orders a customer still sees as "in progress".
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Sent)
    }
}

/// Support ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.ticket_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    Answered,
    Closed,
}

string_enum!(TicketStatus, "ticket status", {
    Open => "open",
    Answered => "answered",
    Closed => "closed",
});

impl TicketStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "باز",
            Self::Answered => "پاسخ داده شده",
            Self::Closed => "بسته شده",
        }
    }
}

/// Where on the storefront a banner is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.banner_position", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BannerPosition {
    /// Home page slider.
    #[default]
    Hero,
    SpecialOfferSide,
    Middle,
    Footer,
}

string_enum!(BannerPosition, "banner position", {
    Hero => "hero",
    SpecialOfferSide => "special_offer_side",
    Middle => "middle",
    Footer => "footer",
});

impl BannerPosition {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hero => "اسلایدر اصلی",
            Self::SpecialOfferSide => "کنار پیشنهاد ویژه",
            Self::Middle => "میانه صفحه",
            Self::Footer => "پایین صفحه",
        }
    }
}

/// Unit a product is sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.product_unit", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductUnit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    #[default]
    Piece,
    Pack,
}

string_enum!(ProductUnit, "product unit", {
    Gram => "gram",
    Kilogram => "kilogram",
    Milliliter => "milliliter",
    Liter => "liter",
    Piece => "piece",
    Pack => "pack",
});

impl ProductUnit {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gram => "گرم",
            Self::Kilogram => "کیلوگرم",
            Self::Milliliter => "میلی‌لیتر",
            Self::Liter => "لیتر",
            Self::Piece => "عدد",
            Self::Pack => "بسته",
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Everything, including managing other staff.
    SuperAdmin,
    /// Full store management.
    Admin,
    /// Read-only.
    Viewer,
}

string_enum!(AdminRole, "admin role", {
    SuperAdmin => "super_admin",
    Admin => "admin",
    Viewer => "viewer",
});

impl AdminRole {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "مدیر ارشد",
            Self::Admin => "مدیر",
            Self::Viewer => "ناظر",
        }
    }

    /// Whether this role may change store data.
    #[must_use]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(*status));
        }
    }

    #[test]
    fn test_unknown_value_is_error() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: shipped");
    }

    #[test]
    fn test_active_statuses() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Sent.is_active());
        assert!(!OrderStatus::Delivered.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn test_banner_position_serde_matches_db_label() {
        let json = serde_json::to_string(&BannerPosition::SpecialOfferSide).unwrap_or_default();
        assert_eq!(json, "\"special_offer_side\"");
    }

    #[test]
    fn test_viewer_cannot_write() {
        assert!(!AdminRole::Viewer.can_write());
        assert!(AdminRole::Admin.can_write());
        assert!(AdminRole::SuperAdmin.can_write());
    }
}
