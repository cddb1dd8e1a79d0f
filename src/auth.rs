// ============================================================================
// Authentification simulée
// ============================================================================
// Machine à états : Anonymous → Authenticating → Authenticated
//
// Aucun serveur : après un délai simulé, n'importe quel couple
// email/mot de passe non vide est accepté.
//
// Découpage en trois temps (comme les commandes du worker) :
// 1. begin()        : thread UI, passe en Authenticating
// 2. authenticate() : async, exécutée par le worker
// 3. complete()     : thread UI, applique le résultat au contexte
// ============================================================================

use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::context::AppContext;
use crate::error::FetchError;
use crate::models::User;

/// Longueur des identifiants générés
const USER_ID_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Demande envoyée au worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    SignIn(SignInForm),
    SignUp(SignUpForm),
}

impl AuthRequest {
    /// Contrôles faits avant le délai simulé
    pub fn validate(&self) -> Result<(), FetchError> {
        let (email, password) = match self {
            AuthRequest::SignIn(form) => (&form.email, &form.password),
            AuthRequest::SignUp(form) => {
                if form.password != form.confirm_password {
                    return Err(FetchError::ValidationFailed(
                        "Passwords do not match".to_string(),
                    ));
                }
                (&form.email, &form.password)
            }
        };

        if email.trim().is_empty() || password.is_empty() {
            return Err(FetchError::ValidationFailed(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }

    fn email(&self) -> &str {
        match self {
            AuthRequest::SignIn(form) => form.email.trim(),
            AuthRequest::SignUp(form) => form.email.trim(),
        }
    }

    /// Nom affiché : partie locale de l'email, ou le nom saisi à l'inscription
    fn display_name(&self) -> String {
        let local_part = self.email().split('@').next().unwrap_or_default().to_string();
        match self {
            AuthRequest::SignUp(form) if !form.name.trim().is_empty() => {
                form.name.trim().to_string()
            }
            _ => local_part,
        }
    }
}

/// Identifiant aléatoire de 9 caractères [a-z0-9]
pub fn generate_user_id(rng: &mut impl Rng) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(USER_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Vérifie la demande, attend le délai simulé et crée l'utilisateur
#[instrument(skip_all)]
pub async fn authenticate(request: AuthRequest, delay: Duration) -> Result<User, FetchError> {
    request.validate()?;

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let id = generate_user_id(&mut rand::thread_rng());
    let user = User::new(id, request.email().to_string(), request.display_name());
    info!(user_id = %user.id, "Authentication succeeded");
    Ok(user)
}

/// État d'authentification vu par l'interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFlow {
    state: AuthState,
    error: Option<FetchError>,
}

impl AuthFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == AuthState::Authenticating
    }

    /// Passe en Authenticating
    ///
    /// Retourne false si une authentification est déjà en cours.
    pub fn begin(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.state = AuthState::Authenticating;
        self.error = None;
        true
    }

    /// Applique le résultat d'authenticate()
    pub fn complete(&mut self, ctx: &mut AppContext, result: Result<User, FetchError>) {
        match result {
            Ok(user) => {
                ctx.set_user(Some(user));
                self.state = AuthState::Authenticated;
                self.error = None;
            }
            Err(err) => {
                warn!(error = %err, "Authentication failed");
                self.state = AuthState::Anonymous;
                self.error = Some(err);
            }
        }
    }

    /// Enchaîne les trois étapes (utilisé hors TUI et en test)
    pub async fn submit(&mut self, ctx: &mut AppContext, request: AuthRequest, delay: Duration) {
        if !self.begin() {
            return;
        }
        let result = authenticate(request, delay).await;
        self.complete(ctx, result);
    }

    pub async fn sign_in(&mut self, ctx: &mut AppContext, form: SignInForm, delay: Duration) {
        self.submit(ctx, AuthRequest::SignIn(form), delay).await
    }

    pub async fn sign_up(&mut self, ctx: &mut AppContext, form: SignUpForm, delay: Duration) {
        self.submit(ctx, AuthRequest::SignUp(form), delay).await
    }

    pub fn sign_out(&mut self, ctx: &mut AppContext) {
        info!("Signing out");
        ctx.set_user(None);
        self.state = AuthState::Anonymous;
        self.error = None;
    }

    /// Efface l'erreur affichée (changement de formulaire)
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DELAY: Duration = Duration::from_secs(1);

    fn sign_in_form(email: &str, password: &str) -> SignInForm {
        SignInForm {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_generate_user_id() {
        let mut rng = StdRng::seed_from_u64(3);
        let id = generate_user_id(&mut rng);
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_creates_user_from_email() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();

        flow.sign_in(&mut ctx, sign_in_form("jane.doe@example.com", "secret"), DELAY)
            .await;

        assert_eq!(flow.state(), AuthState::Authenticated);
        let user = ctx.user().unwrap();
        assert_eq!(user.name, "jane.doe");
        assert_eq!(user.email, "jane.doe@example.com");
        assert_eq!(user.id.len(), 9);
        assert!(!user.is_pro);
        assert!(user.portfolio.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_takes_simulated_delay() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();
        let start = tokio::time::Instant::now();

        flow.sign_in(&mut ctx, sign_in_form("a@b.c", "x"), DELAY).await;

        assert!(start.elapsed() >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_up_uses_form_name() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();
        let form = SignUpForm {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            password: "pw".into(),
            confirm_password: "pw".into(),
        };

        flow.sign_up(&mut ctx, form, DELAY).await;

        assert_eq!(ctx.user().map(|u| u.name.as_str()), Some("Jane Doe"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_password_mismatch_stays_anonymous() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();
        let form = SignUpForm {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "pw1".into(),
            confirm_password: "pw2".into(),
        };

        flow.sign_up(&mut ctx, form, DELAY).await;

        assert_eq!(flow.state(), AuthState::Anonymous);
        assert_eq!(
            flow.error(),
            Some(&FetchError::ValidationFailed("Passwords do not match".into()))
        );
        assert!(ctx.user().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fields_rejected() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();

        flow.sign_in(&mut ctx, sign_in_form("", ""), DELAY).await;

        assert_eq!(flow.state(), AuthState::Anonymous);
        assert!(matches!(flow.error(), Some(FetchError::ValidationFailed(_))));
    }

    #[test]
    fn test_begin_is_exclusive() {
        let mut flow = AuthFlow::new();
        assert!(flow.begin());
        assert!(!flow.begin());
        assert!(flow.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out() {
        let mut ctx = AppContext::new();
        let mut flow = AuthFlow::new();
        flow.sign_in(&mut ctx, sign_in_form("a@b.c", "x"), DELAY).await;

        flow.sign_out(&mut ctx);

        assert_eq!(flow.state(), AuthState::Anonymous);
        assert!(ctx.user().is_none());
    }
}
