use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use security_cell::PasswordSecurityService;
use shared_config::AppConfig;
use shared_database::{AppState, StoreError};
use shared_models::auth::Role;
use shared_utils::jwt::issue_token;

use crate::models::{
    AuthError, DashboardResponse, DoctorSummary, LoginRequest, LoginResponse,
    PharmacistRegisterRequest, RegisterRequest, User,
};
use crate::services::directory::{UserDirectory, UserRepository};

pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    config: Arc<AppConfig>,
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self::with_directory(
            Arc::new(UserRepository::new(state.store.clone())),
            state.config.clone(),
        )
    }

    pub fn with_directory(users: Arc<dyn UserDirectory>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let (Some(username), Some(password), Some(role), Some(email)) = (
            required(&request.username),
            request.password.clone().filter(|p| !p.is_empty()),
            required(&request.role),
            required(&request.email),
        ) else {
            return Err(AuthError::Validation(
                "Username, password, role, and email are required.".to_string(),
            ));
        };

        let role: Role = role.parse().map_err(|_| AuthError::InvalidRole)?;
        let specialty = required(&request.specialty);
        let license_number = required(&request.license_number);

        if role == Role::Doctor && specialty.is_none() {
            return Err(AuthError::Validation("Specialty is required for doctors.".to_string()));
        }

        if matches!(role, Role::Doctor | Role::Pharmacist) && license_number.is_none() {
            return Err(AuthError::Validation(
                "License number is required for this role.".to_string(),
            ));
        }

        let name = required(&request.name).unwrap_or_else(|| username.clone());

        self.create_user(NewUser {
            username,
            password,
            role,
            email,
            name,
            phone: optional(request.phone),
            address: optional(request.address),
            specialty: specialty.filter(|_| role == Role::Doctor),
            license_number,
        })
        .await
    }

    /// Registers a pharmacist and signs them in immediately.
    pub async fn register_pharmacist(
        &self,
        request: PharmacistRegisterRequest,
    ) -> Result<(User, String), AuthError> {
        let (Some(name), Some(email), Some(password), Some(license_number)) = (
            required(&request.name),
            required(&request.email),
            request.password.clone().filter(|p| !p.is_empty()),
            required(&request.license_number),
        ) else {
            return Err(AuthError::Validation(
                "Name, email, password, and license number are required.".to_string(),
            ));
        };

        let user = self
            .create_user(NewUser {
                username: email.clone(),
                password,
                role: Role::Pharmacist,
                email,
                name,
                phone: optional(request.phone),
                address: optional(request.address),
                specialty: None,
                license_number: Some(license_number),
            })
            .await?;

        let token = self.issue(&user)?;
        Ok((user, token))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        debug!("Registering {} user {}", new_user.role, new_user.username);

        if !PasswordSecurityService::meets_minimum_length(&new_user.password) {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters long.".to_string(),
            ));
        }

        let username = new_user.username.clone();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            name: new_user.name,
            password_hash: PasswordSecurityService::hash_password(&new_user.password)?,
            role: new_user.role,
            phone: new_user.phone,
            address: new_user.address,
            specialty: new_user.specialty,
            license_number: new_user.license_number,
            is_active: true,
            created_at: Utc::now(),
        };

        let user = match self.users.insert_user(user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => {
                warn!("Registration rejected, user {} already exists", username);
                return Err(AuthError::UserExists);
            }
            Err(e) => return Err(e.into()),
        };
        info!("User {} registered with role {}", user.id, user.role);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let (Some(username), Some(password)) = (
            required(&request.username),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "Username and password are required.".to_string(),
            ));
        };

        let user = match self.users.find_by_username(&username).await? {
            Some(user) if user.is_active => user,
            _ => {
                debug!("Login failed for unknown or inactive user {}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !PasswordSecurityService::verify_password(&password, &user.password_hash)? {
            warn!("Login failed for user {}: bad password", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue(&user)?;
        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            token,
            role: user.role,
        })
    }

    fn issue(&self, user: &User) -> Result<String, AuthError> {
        issue_token(
            user.id,
            user.role,
            &self.config.jwt_secret,
            self.config.token_ttl_hours,
        )
        .map_err(AuthError::Token)
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, AuthError> {
        let mut doctors: Vec<DoctorSummary> = self
            .users
            .list_by_role(Role::Doctor)
            .await?
            .iter()
            .map(DoctorSummary::from)
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    pub fn dashboard(role: Role) -> DashboardResponse {
        let functionalities: &[&str] = match role {
            Role::Doctor => &[
                "View Appointments",
                "Complete Appointments",
                "Upload Medical Records",
                "Write Prescriptions",
            ],
            Role::Nurse => &[
                "Approve Appointments",
                "Deny Appointments",
                "View Patient Prescriptions",
            ],
            Role::Patient => &[
                "Book Appointment",
                "View Medical History",
                "View Appointments",
                "View Prescriptions",
            ],
            Role::Pharmacist => &[
                "Manage Medicine Inventory",
                "Process Prescriptions",
            ],
            Role::Admin => &["Manage Medicine Inventory", "View Low Stock"],
        };

        DashboardResponse {
            role,
            functionalities: functionalities.iter().map(|f| f.to_string()).collect(),
        }
    }
}

struct NewUser {
    username: String,
    password: String,
    role: Role,
    email: String,
    name: String,
    phone: String,
    address: String,
    specialty: Option<String>,
    license_number: Option<String>,
}
