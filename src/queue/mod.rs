mod sqs;

pub use sqs::SqsQueueClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;

pub const CMD_SCHEDULE_DEPLOYMENT: &str = "api-schedule-deployment";
pub const CMD_UPDATE_DEPLOYMENT: &str = "api-update-deployment";
pub const CMD_DEPLOY_NAMESPACE: &str = "sch-deploy-namespace";

/// The envelope carried on both the inbound (API) queue and the outbound
/// scheduler queue. `receipt_handle` is populated by the queue client on
/// receive and is `None` on a freshly constructed outbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub req_id: Uuid,
    pub group_id: String,
    pub command: String,
    pub body: Value,
    #[serde(default)]
    pub receipt_handle: Option<String>,
}

impl Message {
    pub fn new(id: Uuid, group_id: impl Into<String>, command: impl Into<String>, body: Value) -> Self {
        Message {
            id,
            req_id: Uuid::new_v4(),
            group_id: group_id.into(),
            command: command.into(),
            body,
            receipt_handle: None,
        }
    }
}

/// Send/receive/delete over a FIFO-capable queue. `group_id` on a sent
/// message is honored by implementations that support message grouping
/// (SQS FIFO queues); it is the mechanism by which per-namespace
/// deployments are serialized.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send(&self, queue_url: &str, message: &Message) -> AppResult<()>;

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        visibility_timeout_seconds: i32,
    ) -> AppResult<Vec<Message>>;

    async fn delete(&self, queue_url: &str, message: &Message) -> AppResult<()>;
}
