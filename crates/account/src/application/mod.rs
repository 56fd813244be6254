pub mod admin;
pub mod change_password;
pub mod check_session;
pub mod config;
pub mod confirm_email;
pub mod issue_token;
pub mod recover_password;
pub mod register;
pub mod sign_in;
pub mod update_profile;

pub use admin::{AccountSummary, AdminUseCase};
pub use change_password::{ChangePasswordInput, ChangePasswordUseCase};
pub use check_session::CheckSessionUseCase;
pub use config::AccountConfig;
pub use confirm_email::{ConfirmEmailInput, ConfirmEmailUseCase};
pub use issue_token::{
    validate_bearer_token, BearerClaims, IssueTokenInput, IssueTokenOutput, IssueTokenUseCase,
};
pub use recover_password::{CompleteResetInput, CompleteResetUseCase, RequestResetUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use update_profile::{UpdateProfileInput, UpdateProfileUseCase};
