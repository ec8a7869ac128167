use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use alert_core::config::StoreConfig;
use alert_core::errors::{AlertError, AlertResult, StoreError, StoreResult};
use alert_core::models::{Contact, Device, UserProfile};
use alert_core::traits::UserDataStore;

use crate::http::{build_client, excerpt};

const PAGE_SIZE: &str = "100";
const CONTACTS_COLLECTION: &str = "emergency_contacts";
const DEVICES_COLLECTION: &str = "devices";

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

impl Document {
    /// 文档路径的最后一段即文档ID
    fn id(&self) -> String {
        self.name.rsplit('/').next().unwrap_or_default().to_string()
    }

    /// 只读取字符串字段，空字符串视为缺失
    fn string_field(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(|value| value.get("stringValue"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Firestore REST 用户数据存储
///
/// 布局：`users/{userId}`（displayName），`users/{userId}/emergency_contacts`，
/// `users/{userId}/devices`（fcmToken）。列表接口分页读取直到没有 nextPageToken。
pub struct FirestoreUserDataStore {
    client: reqwest::Client,
    documents_root: Url,
    access_token: String,
}

impl FirestoreUserDataStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> AlertResult<Self> {
        let mut documents_root = Url::parse(&config.api_base_url)
            .map_err(|e| AlertError::Configuration(format!("无效的存储API地址: {e}")))?;
        documents_root
            .path_segments_mut()
            .map_err(|_| AlertError::Configuration("存储API地址不能作为基础路径".to_string()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                config.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
            ]);

        Ok(Self {
            client: build_client(timeout)?,
            documents_root,
            access_token: config.access_token.clone(),
        })
    }

    fn document_url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.documents_root.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable("无效的存储API地址".to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> StoreResult<(StatusCode, String)> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("请求失败: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(format!("读取响应失败: {e}")))?;
        Ok((status, body))
    }

    /// 读取集合中的全部文档
    async fn list_all(&self, user_id: &str, collection: &str) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.document_url(&["users", user_id, collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let (status, body) = self.get(url).await?;
            if !status.is_success() {
                warn!(
                    "读取集合失败: user_id={}, collection={}, status={}",
                    user_id,
                    collection,
                    status.as_u16()
                );
                return Err(StoreError::Unavailable(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    excerpt(&body)
                )));
            }

            let page: ListDocumentsResponse = serde_json::from_str(&body)
                .map_err(|e| StoreError::Decode(format!("{collection}: {e}")))?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "读取集合完成: user_id={}, collection={}, documents={}",
            user_id,
            collection,
            documents.len()
        );
        Ok(documents)
    }
}

#[async_trait]
impl UserDataStore for FirestoreUserDataStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let url = self.document_url(&["users", user_id])?;
        let (status, body) = self.get(url).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                excerpt(&body)
            )));
        }

        let document: Document =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("users: {e}")))?;
        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            display_name: document.string_field("displayName"),
        }))
    }

    async fn list_contacts(&self, user_id: &str) -> StoreResult<Vec<Contact>> {
        let documents = self.list_all(user_id, CONTACTS_COLLECTION).await?;
        Ok(documents
            .iter()
            .map(|document| Contact {
                contact_id: document.id(),
                name: document.string_field("name"),
                phone: document.string_field("phone"),
                email: document.string_field("email"),
                relationship: document.string_field("relationship"),
            })
            .collect())
    }

    async fn list_devices(&self, user_id: &str) -> StoreResult<Vec<Device>> {
        let documents = self.list_all(user_id, DEVICES_COLLECTION).await?;
        Ok(documents
            .iter()
            .map(|document| Device {
                device_id: document.id(),
                push_token: document.string_field("fcmToken"),
            })
            .collect())
    }
}
