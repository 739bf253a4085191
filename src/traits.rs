use uuid::Uuid;

/// A trait for models that have a primary key of type Uuid.
pub trait HasPrimaryKey {
    /// Returns the primary key of the model.
    fn primary_key(&self) -> Uuid;
}

/// A trait for models that belong to exactly one owner.
///
/// The owner id is the partition of the cache key space: invalidating a
/// record's listings means invalidating everything cached for its owner.
pub trait HasOwner {
    /// Returns the id of the owning identity.
    fn owner_id(&self) -> Uuid;
}
