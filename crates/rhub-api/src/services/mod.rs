//! Business services.

pub mod wizard;

pub use wizard::WizardService;
