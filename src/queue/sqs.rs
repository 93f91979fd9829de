use async_trait::async_trait;
use aws_sdk_sqs::Client;

use crate::error::{AppError, AppResult};

use super::{Message, QueueClient};

/// [`QueueClient`] backed by Amazon SQS. Sends use the message's `group_id`
/// as the FIFO `MessageGroupId`, with the message `id` doubling as the
/// deduplication id (every enqueue carries a fresh [`uuid::Uuid`]).
pub struct SqsQueueClient {
    client: Client,
}

impl SqsQueueClient {
    pub fn new(client: Client) -> Self {
        SqsQueueClient { client }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn send(&self, queue_url: &str, message: &Message) -> AppResult<()> {
        let body = serde_json::to_string(message)?;

        self.client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .message_group_id(&message.group_id)
            .message_deduplication_id(message.id.to_string())
            .send()
            .await
            .map_err(|e| AppError::Queue(e.to_string()))?;

        Ok(())
    }

    async fn receive(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        visibility_timeout_seconds: i32,
    ) -> AppResult<Vec<Message>> {
        let response = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .visibility_timeout(visibility_timeout_seconds)
            .send()
            .await
            .map_err(|e| AppError::Queue(e.to_string()))?;

        let mut messages = Vec::new();
        for raw in response.messages() {
            let Some(body) = raw.body() else { continue };
            let mut parsed: Message = serde_json::from_str(body)?;
            parsed.receipt_handle = raw.receipt_handle().map(|s| s.to_string());
            messages.push(parsed);
        }

        Ok(messages)
    }

    async fn delete(&self, queue_url: &str, message: &Message) -> AppResult<()> {
        let Some(receipt_handle) = &message.receipt_handle else {
            return Err(AppError::Queue(format!(
                "cannot delete message {}: no receipt handle",
                message.id
            )));
        };

        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| AppError::Queue(e.to_string()))?;

        Ok(())
    }
}
