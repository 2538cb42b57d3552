pub trait Sealed {}

pub trait HashSealed {}
