//! Shared state for the router, middleware and handlers.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use carebase_advisor::Advisor;
use carebase_contracts::{
    appointment::Appointment,
    error::CarebaseResult,
    patient::Patient,
    prescription::{Medication, Prescription},
    user::User,
};
use carebase_core::{
    traits::{AccessPolicy, ObjectStore, RecordStore},
    tokens::generate_token,
    Gatekeeper, PasswordHasher, Repository, TokenRegistry,
};
use carebase_policy::TomlPolicyEngine;
use carebase_store::{InMemoryStore, LocalObjectStore};
use carebase_verify::SchemaValidator;

use crate::config::Settings;
use crate::schemas::{self, RequestSchemas};

/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ApiContext {
    pub settings: Arc<Settings>,
    pub gate: Arc<Gatekeeper>,
    pub schemas: Arc<RequestSchemas>,
    pub store: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub tokens: Arc<TokenRegistry>,
    pub hasher: PasswordHasher,
    /// Hash of a random password, verified against when a login names an
    /// unknown email so both failure paths pay the same PBKDF2 cost.
    pub decoy_hash: Arc<str>,
    pub advisor: Arc<Advisor>,
}

impl ApiContext {
    /// Build the production wiring described by `settings` and seed the
    /// administrator account when one is configured.
    ///
    /// # Errors
    ///
    /// `Config` when the access policy cannot be loaded or a setting is out
    /// of range; store errors from seeding.
    pub fn from_settings(settings: Settings) -> CarebaseResult<Self> {
        let policy = match &settings.access_policy {
            Some(path) => TomlPolicyEngine::from_file(path)?,
            None => TomlPolicyEngine::embedded()?,
        };
        let objects = LocalObjectStore::new(
            settings.upload_dir.clone(),
            settings.public_base_url.clone(),
        );
        let advisor = Advisor::from_table_path(&settings.symptom_table);

        let ctx = Self::assemble(
            settings,
            Box::new(policy),
            Arc::new(InMemoryStore::new()),
            Arc::new(objects),
            advisor,
        )?;
        ctx.seed_admin()?;
        Ok(ctx)
    }

    /// Wire explicit components together.
    ///
    /// # Errors
    ///
    /// `Config` when `settings` fails validation.
    pub fn assemble(
        settings: Settings,
        policy: Box<dyn AccessPolicy>,
        store: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        advisor: Advisor,
    ) -> CarebaseResult<Self> {
        let mut validator = SchemaValidator::new();
        schemas::register_rules(&mut validator);

        let tokens = TokenRegistry::new(settings.access_token_ttl()?, settings.refresh_token_ttl()?);
        let hasher = PasswordHasher::new(settings.password_iterations);
        let decoy_hash = hasher.hash(&generate_token());

        Ok(Self {
            settings: Arc::new(settings),
            gate: Arc::new(Gatekeeper::new(policy, Box::new(validator))),
            schemas: Arc::new(RequestSchemas::new()),
            store,
            objects,
            tokens: Arc::new(tokens),
            hasher,
            decoy_hash: decoy_hash.into(),
            advisor: Arc::new(advisor),
        })
    }

    pub fn users(&self) -> Repository<User> {
        Repository::new(self.store.clone())
    }

    pub fn patients(&self) -> Repository<Patient> {
        Repository::new(self.store.clone())
    }

    pub fn appointments(&self) -> Repository<Appointment> {
        Repository::new(self.store.clone())
    }

    pub fn prescriptions(&self) -> Repository<Prescription> {
        Repository::new(self.store.clone())
    }

    pub fn medications(&self) -> Repository<Medication> {
        Repository::new(self.store.clone())
    }

    /// Create the configured administrator, or promote and reactivate an
    /// existing account with that email. No-op unless both the email and
    /// password are set.
    pub fn seed_admin(&self) -> CarebaseResult<Option<User>> {
        let (Some(email), Some(password)) = (&self.settings.admin_email, &self.settings.admin_password)
        else {
            return Ok(None);
        };

        let users = self.users();
        if let Some(existing) = users.find_by("email", email.as_str())? {
            let patch = serde_json::json!({ "is_admin": true, "is_active": true });
            let promoted = users.update(&existing.id, &patch)?;
            info!(user_id = %existing.id, "administrator account promoted");
            return Ok(promoted);
        }

        let now = Utc::now();
        let admin = User {
            id: carebase_contracts::new_record_id(),
            email: email.clone(),
            full_name: "Administrator".to_string(),
            is_active: true,
            is_admin: true,
            avatar_url: None,
            hashed_password: self.hasher.hash(password),
            created_at: now,
            updated_at: now,
        };
        let created = users.create(&admin)?;
        info!(user_id = %created.id, "administrator account seeded");
        Ok(Some(created))
    }
}
