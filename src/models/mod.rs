//! Data models for the ticketing platform

pub mod event;
pub mod order;
pub mod query;
pub mod ticket;
pub mod user;
pub mod venue;

// Re-export commonly used types
pub use event::Event;
pub use order::{Order, OrderStatus};
pub use query::{ListQuery, PageMetadata, Pagination};
pub use ticket::{Ticket, TicketType};
pub use user::{Role, User, UserClaims};
pub use venue::Venue;

/// Store a string-backed enum in a TEXT column.
///
/// The type must provide `as_str()` and a `FromStr<Err = String>` impl.
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl From<$ty> for $crate::models::query::SqlValue {
            fn from(v: $ty) -> Self {
                $crate::models::query::SqlValue::Text(v.as_str().to_string())
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_column;
