pub mod bundle;
pub mod variant;

// re-export for cleaner imports
pub use self::bundle::AnnotationBundle;
pub use self::variant::{
    PresenceFlags, RawVariant, SampleCall, Variant, VariantIdentity, VariantType,
};
