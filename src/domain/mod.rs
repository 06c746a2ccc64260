/// Domain layer: value objects and entities shared by every provider adapter
pub mod entities;
pub mod value_objects;
