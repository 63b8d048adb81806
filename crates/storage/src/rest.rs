//! REST client of the document store
//!
//! The document store keeps the profile, the workout history, the settings and the exercise
//! weights of each user. Missing singleton documents are reported with status 404.

use gloo_net::http::{Request, Response};
use liftr_domain as domain;
use serde_json::json;

use crate::{Config, model};

#[allow(async_fn_in_trait)]
pub trait SendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, gloo_net::Error>;
}

#[derive(Clone, Copy, Default)]
pub struct GlooNetSendRequest;

impl SendRequest for GlooNetSendRequest {
    async fn send_request(&self, request: Request) -> Result<Response, gloo_net::Error> {
        request.send().await
    }
}

#[derive(Clone)]
pub struct REST<S: SendRequest> {
    pub sender: S,
    pub config: Config,
}

impl REST<GlooNetSendRequest> {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            sender: GlooNetSendRequest,
            config,
        }
    }
}

impl<S: SendRequest> REST<S> {
    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base_url)
    }

    async fn fetch<T>(&self, request: Request) -> Result<T, domain::ReadError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self.send(request).await?;
        if response.status() == 404 {
            return Err(domain::ReadError::NotFound);
        }
        if !response.ok() {
            return Err(domain::ReadError::Other(status_error(&response).into()));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| domain::ReadError::Other(format!("deserialization failed: {err}").into()))
    }

    /// Fetch a document which may not exist yet.
    async fn fetch_optional<T>(&self, request: Request) -> Result<Option<T>, domain::ReadError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.fetch(request).await {
            Ok(value) => Ok(Some(value)),
            Err(domain::ReadError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn fetch_no_content(&self, request: Request) -> Result<(), domain::WriteError> {
        let response = self.send(request).await?;
        if !response.ok() {
            return Err(domain::WriteError::Other(status_error(&response).into()));
        }
        Ok(())
    }

    async fn send(&self, request: Request) -> Result<Response, domain::StorageError> {
        self.sender
            .send_request(request)
            .await
            .map_err(|_| domain::StorageError::NoConnection)
    }

    fn put<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<Request, domain::WriteError> {
        Request::put(&self.url(path))
            .json(body)
            .map_err(|err| domain::WriteError::Other(Box::new(err)))
    }

    fn get(&self, path: &str) -> Result<Request, domain::ReadError> {
        Request::get(&self.url(path))
            .build()
            .map_err(|err| domain::ReadError::Other(Box::new(err)))
    }
}

impl<S: SendRequest> domain::DocumentStore for REST<S> {
    async fn fetch_profile(
        &self,
        user_id: &domain::UserID,
    ) -> Result<domain::UserProfile, domain::ReadError> {
        let profile = self
            .fetch::<model::UserProfile>(self.get(&format!("users/{user_id}"))?)
            .await?;
        domain::UserProfile::try_from(profile).map_err(|err| domain::ReadError::Other(Box::new(err)))
    }

    async fn store_profile(&self, profile: &domain::UserProfile) -> Result<(), domain::WriteError> {
        self.fetch_no_content(self.put(
            &format!("users/{}", profile.user_id),
            &model::UserProfile::from(profile),
        )?)
        .await
    }

    async fn store_profile_spreadsheet_id(
        &self,
        user_id: &domain::UserID,
        spreadsheet_id: &domain::SpreadsheetID,
    ) -> Result<(), domain::WriteError> {
        self.fetch_no_content(self.put(
            &format!("users/{user_id}"),
            &json!({ "spreadsheetId": spreadsheet_id.to_string() }),
        )?)
        .await
    }

    async fn fetch_workouts(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        let workouts = self
            .fetch::<Vec<model::Workout>>(self.get(&format!(
                "users/{user_id}/workouts?orderBy=date&direction=desc&limit={}",
                self.config.history_limit
            ))?)
            .await?;
        workouts
            .into_iter()
            .map(|workout| {
                domain::Workout::try_from(workout)
                    .map_err(|err| domain::ReadError::Other(Box::new(err)))
            })
            .collect()
    }

    async fn store_workout(
        &self,
        user_id: &domain::UserID,
        workout: &domain::Workout,
    ) -> Result<(), domain::WriteError> {
        self.fetch_no_content(self.put(
            &format!("users/{user_id}/workouts/{}", workout.id),
            &model::Workout::from(workout),
        )?)
        .await
    }

    async fn fetch_settings(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Option<domain::UserSettings>, domain::ReadError> {
        self.fetch_optional::<model::UserSettings>(
            self.get(&format!("users/{user_id}/settings/preferences"))?,
        )
        .await?
        .map(|settings| {
            domain::UserSettings::try_from(settings)
                .map_err(|err| domain::ReadError::Other(Box::new(err)))
        })
        .transpose()
    }

    async fn store_settings(
        &self,
        user_id: &domain::UserID,
        settings: &domain::UserSettings,
    ) -> Result<(), domain::WriteError> {
        self.fetch_no_content(self.put(
            &format!("users/{user_id}/settings/preferences"),
            &model::UserSettings::from(settings),
        )?)
        .await
    }

    async fn fetch_exercise_weights(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Option<domain::ExerciseWeights>, domain::ReadError> {
        self.fetch_optional::<WeightsDocument>(
            self.get(&format!("users/{user_id}/settings/weights"))?,
        )
        .await?
        .map(|document| {
            domain::ExerciseWeights::try_from(document.weights)
                .map_err(|err| domain::ReadError::Other(Box::new(err)))
        })
        .transpose()
    }

    async fn store_exercise_weights(
        &self,
        user_id: &domain::UserID,
        weights: &domain::ExerciseWeights,
    ) -> Result<(), domain::WriteError> {
        self.fetch_no_content(self.put(
            &format!("users/{user_id}/settings/weights"),
            &WeightsDocument {
                weights: model::ExerciseWeights::from(weights),
            },
        )?)
        .await
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
struct WeightsDocument {
    weights: model::ExerciseWeights,
}

pub(crate) fn status_error(response: &Response) -> anyhow::Error {
    anyhow::anyhow!("{} {}", response.status(), response.status_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    mod wasm {
        use liftr_domain::DocumentStore;
        use pretty_assertions::assert_eq;
        use wasm_bindgen_test::wasm_bindgen_test;

        use crate::tests::{
            data::{PROFILE, SETTINGS, SPREADSHEET_ID, USER_ID, WORKOUT, WORKOUT_2},
            mock::MockSendRequest,
        };

        use super::*;

        #[wasm_bindgen_test]
        async fn test_fetch_profile() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .json(&model::UserProfile::from(&*PROFILE))
                .unwrap())));

            assert_eq!(rest.fetch_profile(&USER_ID).await.unwrap(), PROFILE.clone());
            assert_eq!(
                rest.sender.urls()[0],
                "api/users/user_1"
            );
        }

        #[wasm_bindgen_test]
        async fn test_fetch_profile_not_found() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(404)
                .body::<Option<&str>>(None)
                .unwrap())));

            assert!(matches!(
                rest.fetch_profile(&USER_ID).await,
                Err(domain::ReadError::NotFound)
            ));
        }

        #[wasm_bindgen_test]
        async fn test_fetch_profile_no_connection() {
            assert!(matches!(
                rest_with_response(None).fetch_profile(&USER_ID).await,
                Err(domain::ReadError::Storage(
                    domain::StorageError::NoConnection
                ))
            ));
        }

        #[wasm_bindgen_test]
        async fn test_store_profile_spreadsheet_id() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .body::<Option<&str>>(None)
                .unwrap())));

            rest.store_profile_spreadsheet_id(&USER_ID, &SPREADSHEET_ID)
                .await
                .unwrap();

            assert_eq!(rest.sender.methods(), vec![gloo_net::http::Method::PUT]);
            assert_eq!(rest.sender.urls(), vec!["api/users/user_1"]);
        }

        #[wasm_bindgen_test]
        async fn test_fetch_workouts() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .json(&vec![
                    model::Workout::from(&*WORKOUT_2),
                    model::Workout::from(&*WORKOUT),
                ])
                .unwrap())));

            assert_eq!(
                rest.fetch_workouts(&USER_ID).await.unwrap(),
                vec![WORKOUT_2.clone(), WORKOUT.clone()]
            );
            assert_eq!(
                rest.sender.urls()[0],
                "api/users/user_1/workouts?orderBy=date&direction=desc&limit=50"
            );
        }

        #[wasm_bindgen_test]
        async fn test_store_workout() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .body::<Option<&str>>(None)
                .unwrap())));

            rest.store_workout(&USER_ID, &WORKOUT).await.unwrap();

            assert_eq!(
                rest.sender.urls()[0],
                "api/users/user_1/workouts/workout_1714989600000_abc123def"
            );
        }

        #[wasm_bindgen_test]
        async fn test_store_workout_server_error() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(500)
                .body::<Option<&str>>(None)
                .unwrap())));

            assert!(matches!(
                rest.store_workout(&USER_ID, &WORKOUT).await,
                Err(domain::WriteError::Other(_))
            ));
        }

        #[wasm_bindgen_test]
        async fn test_fetch_settings() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .json(&model::UserSettings::from(&SETTINGS))
                .unwrap())));

            assert_eq!(rest.fetch_settings(&USER_ID).await.unwrap(), Some(SETTINGS));
        }

        #[wasm_bindgen_test]
        async fn test_fetch_settings_absent() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(404)
                .body::<Option<&str>>(None)
                .unwrap())));

            assert_eq!(rest.fetch_settings(&USER_ID).await.unwrap(), None);
        }

        #[wasm_bindgen_test]
        async fn test_fetch_exercise_weights() {
            let rest = rest_with_response(Some(Ok(Response::builder()
                .status(200)
                .json(&json!({ "weights": { "Dips": 10.0 } }))
                .unwrap())));

            let mut weights = domain::ExerciseWeights::new();
            weights.set("Dips", domain::Weight::new(10.0).unwrap());

            assert_eq!(
                rest.fetch_exercise_weights(&USER_ID).await.unwrap(),
                Some(weights)
            );
            assert_eq!(
                rest.sender.urls()[0],
                "api/users/user_1/settings/weights"
            );
        }

        fn rest_with_response(
            response: Option<Result<Response, gloo_net::Error>>,
        ) -> REST<MockSendRequest> {
            REST {
                sender: MockSendRequest::new(response),
                config: Config::default(),
            }
        }
    }
}
