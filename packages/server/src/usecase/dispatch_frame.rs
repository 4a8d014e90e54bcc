//! UseCase: 受信フレームの振り分け
//!
//! Parses one inbound text frame and turns it into the matching hub request.
//! Membership changes are awaited so the confirmation frame returned to the
//! caller is only produced after the hub applied them.

use std::sync::Arc;

use hiroba_shared::protocol::{Command, Reply};

use crate::domain::{ConnectionId, DisplayName, HubError, MessageBroker, RoomName};

use super::error::DispatchError;

/// 受信フレーム処理のユースケース
pub struct DispatchFrameUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl DispatchFrameUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Handle a frame received from `sender`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Reply))` - 送信者本人にだけ返す確認フレーム
    /// * `Ok(None)` - 返信なし
    /// * `Err(DispatchError)` - 不正なフレーム、またはハブ停止
    pub async fn execute(
        &self,
        sender: &ConnectionId,
        frame: &str,
    ) -> Result<Option<Reply>, DispatchError> {
        match Command::parse(frame)? {
            Command::JoinRoom { room } => {
                let room_name = RoomName::new(room.clone())?;
                match self.broker.join_room(sender.clone(), room_name).await {
                    Ok(()) => Ok(Some(Reply::JoinRoomSuccess(room))),
                    Err(HubError::RoomLimitReached(_)) => Ok(Some(Reply::JoinRoomFailed(room))),
                    Err(e) => Err(e.into()),
                }
            }
            Command::RoomMessage { room, body } => {
                let room = RoomName::new(room)?;
                self.broker
                    .send_to_room(room, body, Some(sender.clone()))
                    .await?;
                Ok(None)
            }
            Command::LeaveRoom { room } => {
                let room_name = RoomName::new(room.clone())?;
                self.broker.leave_room(sender.clone(), room_name).await?;
                Ok(Some(Reply::LeaveRoomSuccess(room)))
            }
            Command::PrivateMessage { recipient, body } => {
                let name = DisplayName::new(recipient)?;
                self.broker.send_to_name(name, body).await?;
                Ok(None)
            }
            Command::Broadcast { body } => {
                self.broker.broadcast(body).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hiroba_shared::protocol::ProtocolError;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::{MockMessageBroker, ValueObjectError};

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_join_room_replies_success() {
        // テスト項目: join_room は参加後に join_room_success を返す
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_join_room()
            .with(eq(id("alice")), eq(room("lobby")))
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase.execute(&id("alice"), "join_room:lobby").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Some(Reply::JoinRoomSuccess("lobby".to_string())))
        );
    }

    #[tokio::test]
    async fn test_join_room_over_limit_replies_failure() {
        // テスト項目: ルーム数上限で参加できない場合は join_room_failed を返す
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_join_room()
            .returning(|_, _| Err(HubError::RoomLimitReached(1)));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase.execute(&id("alice"), "join_room:second").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Some(Reply::JoinRoomFailed("second".to_string())))
        );
    }

    #[tokio::test]
    async fn test_room_message_excludes_sender() {
        // テスト項目: room_message は送信者を除外してルームに配信される
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_send_to_room()
            .with(
                eq(room("lobby")),
                eq("hello there".to_string()),
                eq(Some(id("alice"))),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase
            .execute(&id("alice"), "room_message:lobby hello there")
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_leave_room_replies_success() {
        // テスト項目: leave_room は退出後に leave_room_success を返す
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_leave_room()
            .with(eq(id("alice")), eq(room("lobby")))
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase.execute(&id("alice"), "leave_room:lobby").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Some(Reply::LeaveRoomSuccess("lobby".to_string())))
        );
    }

    #[tokio::test]
    async fn test_private_message_targets_display_name() {
        // テスト項目: private_message は表示名宛てに本文だけを送る
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_send_to_name()
            .withf(|name, payload| name.as_str() == "root" && payload == "hi")
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase
            .execute(&id("bob"), "private_message:root hi")
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_plain_text_is_broadcast_normalized() {
        // テスト項目: プレフィックスのないフレームは改行を空白に置き換えて全体配信される
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_broadcast()
            .with(eq("hello world".to_string()))
            .times(1)
            .returning(|_| Ok(()));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase.execute(&id("alice"), "  hello\nworld \n").await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_malformed_frames_never_reach_hub() {
        // テスト項目: 不正なフレームはハブに送られずエラーになる
        // given (前提条件): 期待値を設定しないモックは呼び出されると panic する
        let usecase = DispatchFrameUseCase::new(Arc::new(MockMessageBroker::new()));

        // when (操作):
        let empty = usecase.execute(&id("alice"), " \n ").await;
        let no_body = usecase.execute(&id("alice"), "room_message:lobby").await;
        let bad_name = usecase
            .execute(&id("alice"), "private_message:a/b hi")
            .await;
        let spaced_room = usecase.execute(&id("alice"), "join_room:my room").await;

        // then (期待する結果):
        assert_eq!(empty, Err(DispatchError::Protocol(ProtocolError::EmptyFrame)));
        assert!(matches!(
            no_body,
            Err(DispatchError::Protocol(ProtocolError::MissingBody(_)))
        ));
        assert_eq!(
            bad_name,
            Err(DispatchError::InvalidValue(
                ValueObjectError::InvalidCharacters("display name")
            ))
        );
        assert_eq!(
            spaced_room,
            Err(DispatchError::InvalidValue(
                ValueObjectError::InvalidCharacters("room name")
            ))
        );
    }

    #[tokio::test]
    async fn test_stopped_hub_is_fatal() {
        // テスト項目: ハブ停止時のエラーは致命的として扱われる
        // given (前提条件):
        let mut broker = MockMessageBroker::new();
        broker
            .expect_broadcast()
            .returning(|_| Err(HubError::ChannelClosed));
        let usecase = DispatchFrameUseCase::new(Arc::new(broker));

        // when (操作):
        let result = usecase.execute(&id("alice"), "hello").await;

        // then (期待する結果):
        let error = result.unwrap_err();
        assert_eq!(error, DispatchError::HubUnavailable);
        assert!(error.is_fatal());
    }
}
