// Application layer - Use case interactors

pub mod container;
pub mod convert_interactor;
pub mod inspect_interactor;

// Re-export interactors
pub use convert_interactor::ConvertInteractor;
pub use inspect_interactor::InspectInteractor;
