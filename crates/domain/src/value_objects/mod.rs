pub mod money;
pub mod percentage;

pub use money::Money;
pub use percentage::Percent;
