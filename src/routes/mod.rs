mod auth;
mod contacts;
mod health_check;
mod users;

pub use auth::{get_current_user, login, refresh_token, signup};
pub use contacts::{
    create_contact, delete_contact, get_contact, list_all_contacts, list_contacts,
    update_contact, Contact,
};
pub use health_check::health_check;
pub use users::{reset_password, upload_avatar, verify_email, MAX_AVATAR_BYTES};
