pub mod lambert_pass;
pub(crate) mod pass;
