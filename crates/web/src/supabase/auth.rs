//! `GoTrue` calls: password sign-in, sign-up, sign-out, user lookup and
//! metadata updates.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use rentswipe_core::{Email, User, UserMetadata};

use super::conversions::{convert_token, convert_user};
use super::types::{
    AuthSession, AuthUserRow, SignUpOutcome, SignUpResponse, TokenResponse, UpdateUserBody,
};
use super::{SupabaseClient, SupabaseError, decode, expect_success};

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";
const USER_PATH: &str = "auth/v1/user";

impl SupabaseClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] for rejected credentials, or an error if
    /// the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });

        let response = self
            .http()
            .post(url)
            .bearer_auth(self.anon_bearer())
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = decode(response).await?;
        Ok(convert_token(token, Utc::now().timestamp()))
    }

    /// Create an account. `full_name` and a cleared onboarding flag are stored
    /// as user metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] if the account exists or the password
    /// is refused, or an error if the request fails.
    #[instrument(skip(self, password, full_name), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        full_name: &str,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let url = self.endpoint(SIGNUP_PATH)?;
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "data": {
                "full_name": full_name,
                "onboarding_completed": false,
            },
        });

        let response = self
            .http()
            .post(url)
            .bearer_auth(self.anon_bearer())
            .json(&body)
            .send()
            .await?;

        Ok(match decode::<SignUpResponse>(response).await? {
            SignUpResponse::Session(token) => {
                SignUpOutcome::SignedIn(convert_token(token, Utc::now().timestamp()))
            }
            SignUpResponse::PendingConfirmation(user) => {
                SignUpOutcome::ConfirmationRequired(convert_user(user))
            }
        })
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is rejected.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(LOGOUT_PATH)?;
        let response = self
            .http()
            .post(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        expect_success(response).await
    }

    /// Fetch the user behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<User, SupabaseError> {
        let url = self.endpoint(USER_PATH)?;
        let response = self
            .http()
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let row: AuthUserRow = decode(response).await?;
        Ok(convert_user(row))
    }

    /// Merge `metadata` into the user's metadata and return the updated user.
    ///
    /// Fields left as `None` are not sent and keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip_all)]
    pub async fn update_metadata(
        &self,
        access_token: &str,
        metadata: &UserMetadata,
    ) -> Result<User, SupabaseError> {
        let url = self.endpoint(USER_PATH)?;
        let response = self
            .http()
            .put(url)
            .bearer_auth(access_token)
            .json(&UpdateUserBody { data: metadata })
            .send()
            .await?;

        let row: AuthUserRow = decode(response).await?;
        Ok(convert_user(row))
    }
}
