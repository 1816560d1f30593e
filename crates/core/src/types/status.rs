//! Status and classification enums.
//!
//! Every enum here is stored as `TEXT` in PostgreSQL and serialized to JSON
//! using the same spelling, so the `text_enum!` macro generates the string
//! mapping once for serde, `Display`/`FromStr` and sqlx.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a variant of a status enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    /// The enum that failed to parse.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected input.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stored and serialized spelling.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    }),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                let s = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<Self>()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

text_enum! {
    /// Account role. Higher roles inherit every permission of lower ones.
    pub enum UserRole {
        Customer => "customer",
        Staff => "staff",
        Manager => "manager",
        Admin => "admin",
    }
}

impl UserRole {
    /// Position in the role hierarchy (customer = 1 ... admin = 4).
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Customer => 1,
            Self::Staff => 2,
            Self::Manager => 3,
            Self::Admin => 4,
        }
    }

    /// Whether this role grants at least the permissions of `required`.
    #[must_use]
    pub const fn has_at_least(self, required: Self) -> bool {
        self.level() >= required.level()
    }
}

text_enum! {
    /// Loyalty membership level.
    #[derive(PartialOrd, Ord)]
    pub enum CustomerTier {
        Bronze => "Bronze",
        Silver => "Silver",
        Gold => "Gold",
        Platinum => "Platinum",
    }
}

text_enum! {
    /// Membership standing of a customer record.
    pub enum MemberStatus {
        Active => "Active",
        Inactive => "Inactive",
        Suspended => "Suspended",
    }
}

text_enum! {
    /// Catalog availability of a product.
    pub enum StockStatus {
        InStock => "in_stock",
        LowStock => "low_stock",
        OutOfStock => "out_of_stock",
        PreOrder => "pre_order",
    }
}

impl StockStatus {
    /// Quantities at or below this count (and above zero) are low stock.
    pub const LOW_STOCK_THRESHOLD: i32 = 10;

    /// Derive the status from on-hand quantity.
    #[must_use]
    pub const fn from_quantity(quantity: i32, pre_order: bool) -> Self {
        if pre_order {
            Self::PreOrder
        } else if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= Self::LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

text_enum! {
    /// Lifecycle of a booked service appointment.
    pub enum AppointmentStatus {
        Scheduled => "scheduled",
        Confirmed => "confirmed",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

impl AppointmentStatus {
    /// Whether an appointment in this status still holds its time slot.
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }
}

text_enum! {
    /// Payment state of an appointment.
    pub enum PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Lifecycle of a service or repair request.
    pub enum WorkOrderStatus {
        Submitted => "submitted",
        Assigned => "assigned",
        InProgress => "in_progress",
        WaitingParts => "waiting_parts",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

text_enum! {
    /// Urgency of a work order.
    pub enum WorkOrderPriority {
        Low => "low",
        Normal => "normal",
        High => "high",
        Urgent => "urgent",
    }
}

text_enum! {
    /// State of a purchase order.
    pub enum OrderStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Channel an order was placed through.
    pub enum OrderOrigin {
        Online => "online",
        Pos => "pos",
        Mobile => "mobile",
    }
}

text_enum! {
    /// How often a promotion can be redeemed by one member.
    pub enum UsageType {
        Once => "Once",
        Limited => "Limited",
        Unlimited => "Unlimited",
    }
}

text_enum! {
    /// A member's enrollment in a promotion.
    pub enum EnrollmentStatus {
        Enrolled => "Enrolled",
        Completed => "Completed",
        Withdrawn => "Withdrawn",
    }
}

text_enum! {
    /// Kind of value a voucher carries.
    pub enum VoucherType {
        Value => "Value",
        Percentage => "Percentage",
        Product => "Product",
        FreeShipping => "FreeShipping",
    }
}

text_enum! {
    /// Redemption state of a voucher.
    pub enum VoucherStatus {
        Issued => "Issued",
        Redeemed => "Redeemed",
        Expired => "Expired",
        Cancelled => "Cancelled",
    }
}

text_enum! {
    /// How a system setting's text value is interpreted.
    #[derive(Default)]
    pub enum SettingType {
        #[default]
        String => "string",
        Number => "number",
        Boolean => "boolean",
        Json => "json",
    }
}

text_enum! {
    /// Grouping for system settings.
    #[derive(Default)]
    pub enum SettingCategory {
        #[default]
        General => "general",
        Pos => "pos",
        Loyalty => "loyalty",
        Inventory => "inventory",
        Email => "email",
        Integration => "integration",
        Chat => "chat",
    }
}
