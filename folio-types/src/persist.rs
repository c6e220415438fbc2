//! The entity persistence capability.

/// Capability implemented by entity types stored in a collection.
///
/// The core is format-agnostic: how a value maps to bytes is entirely owned
/// by the implementation. The only structural requirement is a cheap
/// `Partial` projection that can be derived without decoding the full
/// payload, used for sorting and display.
pub trait Persistable: Sized + Send + Sync + 'static {
    /// Cheap metadata derived from a full value.
    type Partial: Clone + Send + Sync + 'static;
    /// Encode/decode failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The partial projection of this value.
    fn partial(&self) -> Self::Partial;

    /// Encodes a full value for persistence.
    fn encode(&self) -> Result<Vec<u8>, Self::Error>;

    /// Decodes a full value from persisted bytes.
    fn decode(bytes: &[u8]) -> Result<Self, Self::Error>;

    /// Decodes only the partial projection from persisted bytes.
    fn decode_partial(bytes: &[u8]) -> Result<Self::Partial, Self::Error>;

    /// Extension (without the dot) of every file holding such an entity.
    fn file_extension() -> &'static str;
}

/// Entities that can name their own file.
pub trait SuggestsFilename: Persistable {
    /// A filename (without extension) for this value.
    fn suggested_filename(&self) -> String;
}
