//! The `record!` macro.

/// Declare a record struct and generate its [`Record`](crate::record::Record)
/// and [`Field`](crate::record::Field) impls.
///
/// Every field type must itself implement `Field`: a supported scalar, an
/// `Option` of one, or another record declared with this macro (which is
/// then embedded as prefixed columns). The table name defaults to the
/// snake-cased struct name and the primary key to the first field; both can
/// be overridden after the struct name.
///
/// ```
/// use stowdb_core::record;
///
/// record! {
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct Resist {
///         pub fire: f64,
///         pub ice: f64,
///     }
/// }
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Hat [table = "hats"] [primary_key = url] {
///         pub name: String,
///         pub url: String,
///         pub resist: Resist,
///         pub level: Option<i64>,
///     }
/// }
///
/// use stowdb_core::record::Record;
/// let schema = Hat::schema().unwrap();
/// assert_eq!(schema.table_name(), "hats");
/// assert_eq!(schema.column_list(), "name, url, resist_fire, resist_ice, level");
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident
        $([table = $table:literal])?
        $([primary_key = $pk:ident])?
        {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )+
        }

        impl $crate::record::Record for $name {
            fn descriptor() -> $crate::types::RecordDescriptor {
                $crate::types::RecordDescriptor::new::<$name>(stringify!($name))
                    $(.table($table))?
                    $(.primary_key(stringify!($pk)))?
                    $(
                        .field(
                            stringify!($field),
                            <$ty as $crate::record::Field>::declared_type(),
                        )
                    )+
            }

            fn encode_fields(&self, out: &mut ::std::vec::Vec<$crate::encoding::Value>) {
                $(
                    $crate::record::Field::encode(&self.$field, out);
                )+
            }

            fn decode_fields(
                values: &mut $crate::encoding::ValueCursor<'_>,
            ) -> ::std::result::Result<Self, $crate::error::Error> {
                ::std::result::Result::Ok(Self {
                    $(
                        $field: <$ty as $crate::record::Field>::decode(values)?,
                    )+
                })
            }

            fn setters() -> ::std::vec::Vec<$crate::api::update::Setter<Self>> {
                ::std::vec![
                    $(
                        $crate::api::update::Setter::<Self>::new(stringify!($field), |record, values| {
                            record.$field = <$ty as $crate::record::Field>::decode(values)?;
                            ::std::result::Result::Ok(())
                        }),
                    )+
                ]
            }
        }

        impl $crate::record::Field for $name {
            fn declared_type() -> $crate::types::DeclaredType {
                $crate::types::DeclaredType::record::<$name>()
            }

            fn encode(&self, out: &mut ::std::vec::Vec<$crate::encoding::Value>) {
                $crate::record::Record::encode_fields(self, out);
            }

            fn decode(
                values: &mut $crate::encoding::ValueCursor<'_>,
            ) -> ::std::result::Result<Self, $crate::error::Error> {
                $crate::encoding::decode_embedded::<$name>(values)
            }
        }
    };
}
