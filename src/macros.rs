//! Declarative helpers for opting types into a model.

/// Implements [`ModelType`](crate::ModelType) for entities that implement
/// `Default`.
///
/// The default value is what the deserializer starts from when no
/// constructor is registered.
///
/// ```rust
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Point {
///     x: i32,
/// }
///
/// xml_model::entity_type!(Point);
/// ```
#[macro_export]
macro_rules! entity_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ModelType for $ty {
                fn instantiate() -> ::core::option::Option<Self> {
                    ::core::option::Option::Some(<$ty as ::core::default::Default>::default())
                }
            }
        )+
    };
}

/// Implements [`ModelType`](crate::ModelType) for types that also implement
/// [`Scalar`](crate::Scalar).
#[macro_export]
macro_rules! scalar_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ModelType for $ty {
                fn type_descriptor() -> $crate::TypeDescriptor {
                    $crate::convert::scalar_descriptor::<$ty>()
                }
            }
        )+
    };
}

/// Implements [`ModelType`](crate::ModelType) for abstract types.
///
/// Members of such a type are rejected by the model builder.
#[macro_export]
macro_rules! contract_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ModelType for $ty {
                fn type_descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::contract::<$ty>()
                }
            }
        )+
    };
}

/// Builds a [`Member`](crate::Member) for a field.
///
/// ```rust
/// # #[derive(Debug, Clone, PartialEq, Default)]
/// # struct Base { id: u32 }
/// # #[derive(Debug, Clone, PartialEq, Default)]
/// # struct Order { base: Base, note: Option<String>, total: f64, lines: Vec<u32> }
/// # xml_model::entity_type!(Base, Order);
/// use xml_model::member;
///
/// let total = member!(Order, total);                 // read and write
/// let note = member!(Order, optional note);          // `Option<String>` field as a `String` member
/// let id = member!(Order, "id" => base.id)           // nested field under another name
///     .declared_in::<Base>();
/// let lines = member!(Order, readonly lines);        // no setter, refilled in place
/// # let _ = (total, note, id, lines);
/// ```
#[macro_export]
macro_rules! member {
    ($owner:ty, readonly $field:ident) => {
        $crate::Member::<$owner, _>::read_only(::core::stringify!($field), |o| {
            ::core::option::Option::Some(&o.$field)
        })
        .with_mut(|o| ::core::option::Option::Some(&mut o.$field))
    };
    ($owner:ty, optional $field:ident) => {
        $crate::Member::<$owner, _>::new(
            ::core::stringify!($field),
            |o| o.$field.as_ref(),
            |o, v| o.$field = ::core::option::Option::Some(v),
        )
        .with_mut(|o| o.$field.as_mut())
    };
    ($owner:ty, $name:literal => $($path:ident).+) => {
        $crate::Member::<$owner, _>::new(
            $name,
            |o| ::core::option::Option::Some(&o.$($path).+),
            |o, v| o.$($path).+ = v,
        )
        .with_mut(|o| ::core::option::Option::Some(&mut o.$($path).+))
    };
    ($owner:ty, $field:ident) => {
        $crate::Member::<$owner, _>::new(
            ::core::stringify!($field),
            |o| ::core::option::Option::Some(&o.$field),
            |o, v| o.$field = v,
        )
        .with_mut(|o| ::core::option::Option::Some(&mut o.$field))
    };
}
