//! In-memory implementation of `EventChannel`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use socialnet_core::channel::{
    ChannelError, ChannelSpec, EventChannel, Message, PartitionReader, RecordPosition,
    dead_letter_channel,
};
use socialnet_core::event::EventEnvelope;
use tokio::sync::Notify;
use tracing::debug;

use crate::partition::partition_for;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Partition {
    records: RwLock<Vec<EventEnvelope>>,
    appended: Notify,
}

impl Partition {
    fn len(&self) -> u64 {
        read(&self.records).len() as u64
    }
}

/// Committed offsets and partition claims of one consumer group.
#[derive(Debug)]
struct GroupState {
    committed: Vec<AtomicU64>,
    claimed: Vec<AtomicBool>,
}

impl GroupState {
    fn new(partitions: usize) -> Self {
        Self {
            committed: (0..partitions).map(|_| AtomicU64::new(0)).collect(),
            claimed: (0..partitions).map(|_| AtomicBool::new(false)).collect(),
        }
    }
}

#[derive(Debug)]
struct Topic {
    name: String,
    partitions: Vec<Partition>,
    groups: Mutex<HashMap<String, Arc<GroupState>>>,
}

impl Topic {
    fn new(spec: &ChannelSpec, name: String) -> Self {
        Self {
            name,
            partitions: (0..spec.partitions.max(1))
                .map(|_| Partition::default())
                .collect(),
            groups: Mutex::new(HashMap::new()),
        }
    }

    fn partition_count(&self) -> u32 {
        u32::try_from(self.partitions.len()).unwrap_or(u32::MAX)
    }

    fn lag(&self, group: &GroupState) -> u64 {
        self.partitions
            .iter()
            .zip(&group.committed)
            .map(|(partition, committed)| {
                partition
                    .len()
                    .saturating_sub(committed.load(Ordering::SeqCst))
            })
            .sum()
    }
}

#[derive(Debug, Default)]
struct Broker {
    topics: RwLock<HashMap<String, Arc<Topic>>>,
    closed: AtomicBool,
}

impl Broker {
    fn topic(&self, name: &str) -> Result<Arc<Topic>, ChannelError> {
        read(&self.topics)
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_owned()))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A partitioned log living in process memory.
///
/// Cloning is cheap and every clone shares the same log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChannel {
    broker: Arc<Broker>,
}

impl InMemoryChannel {
    /// Creates a channel with nothing declared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel with every system channel (and its dead-letter
    /// channel) declared.
    #[must_use]
    pub fn with_system_channels() -> Self {
        let channel = Self::new();
        for spec in ChannelSpec::system() {
            channel.declare_spec(&spec);
        }
        channel
    }

    /// Declares `spec` and its dead-letter channel.
    pub fn declare_spec(&self, spec: &ChannelSpec) {
        let mut topics = write(&self.broker.topics);
        for name in [spec.name.clone(), dead_letter_channel(&spec.name)] {
            topics.entry(name.clone()).or_insert_with(|| {
                debug!(channel = %name, partitions = spec.partitions, "declared channel");
                Arc::new(Topic::new(spec, name))
            });
        }
    }

    /// Declared channel names, sorted.
    #[must_use]
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.broker.topics).keys().cloned().collect();
        names.sort();
        names
    }

    /// Partition count of a declared channel.
    #[must_use]
    pub fn partitions(&self, channel: &str) -> Option<u32> {
        self.broker.topic(channel).ok().map(|t| t.partition_count())
    }

    /// Every record on `channel`, partition by partition, in offset order.
    #[must_use]
    pub fn records(&self, channel: &str) -> Vec<EventEnvelope> {
        self.broker
            .topic(channel)
            .map(|topic| {
                topic
                    .partitions
                    .iter()
                    .flat_map(|p| read(&p.records).clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Records on one partition of `channel`, in offset order.
    #[must_use]
    pub fn partition_records(&self, channel: &str, partition: u32) -> Vec<EventEnvelope> {
        self.broker
            .topic(channel)
            .ok()
            .and_then(|topic| {
                topic
                    .partitions
                    .get(partition as usize)
                    .map(|p| read(&p.records).clone())
            })
            .unwrap_or_default()
    }

    /// Records on `channel` not yet committed by `group`. A group that never
    /// subscribed lags by the whole channel.
    #[must_use]
    pub fn lag(&self, channel: &str, group: &str) -> u64 {
        let Ok(topic) = self.broker.topic(channel) else {
            return 0;
        };
        let state = lock(&topic.groups).get(group).cloned();
        match state {
            Some(state) => topic.lag(&state),
            None => topic.partitions.iter().map(Partition::len).sum(),
        }
    }

    /// Whether every group on every channel has committed everything.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        read(&self.broker.topics).values().all(|topic| {
            lock(&topic.groups)
                .values()
                .all(|state| topic.lag(state) == 0)
        })
    }

    /// Shuts the channel down: publishes fail and readers return `None`.
    pub fn close(&self) {
        self.broker.closed.store(true, Ordering::SeqCst);
        for topic in read(&self.broker.topics).values() {
            for partition in &topic.partitions {
                partition.appended.notify_waiters();
            }
        }
    }
}

#[async_trait]
impl EventChannel for InMemoryChannel {
    async fn declare(&self, spec: &ChannelSpec) -> Result<(), ChannelError> {
        if self.broker.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.declare_spec(spec);
        Ok(())
    }

    async fn publish(&self, envelope: &EventEnvelope) -> Result<RecordPosition, ChannelError> {
        if self.broker.is_closed() {
            return Err(ChannelError::Closed);
        }
        let topic = self.broker.topic(&envelope.channel)?;
        let partition = partition_for(&envelope.partition_key, topic.partition_count());
        let slot = &topic.partitions[partition as usize];
        let offset = {
            let mut records = write(&slot.records);
            records.push(envelope.clone());
            records.len() as u64 - 1
        };
        slot.appended.notify_waiters();
        debug!(
            channel = %topic.name,
            partition,
            offset,
            key = %envelope.partition_key,
            "published record"
        );
        Ok(RecordPosition { partition, offset })
    }

    async fn subscribe(
        &self,
        channel: &str,
        group: &str,
    ) -> Result<Vec<Box<dyn PartitionReader>>, ChannelError> {
        if self.broker.is_closed() {
            return Err(ChannelError::Closed);
        }
        let topic = self.broker.topic(channel)?;
        let state = Arc::clone(
            lock(&topic.groups)
                .entry(group.to_owned())
                .or_insert_with(|| Arc::new(GroupState::new(topic.partitions.len()))),
        );

        let mut readers: Vec<Box<dyn PartitionReader>> = Vec::new();
        for (index, claimed) in state.claimed.iter().enumerate() {
            if claimed
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                continue;
            }
            let partition = u32::try_from(index).unwrap_or(u32::MAX);
            readers.push(Box::new(InMemoryPartitionReader {
                broker: Arc::clone(&self.broker),
                topic: Arc::clone(&topic),
                group: Arc::clone(&state),
                partition,
                cursor: state.committed[index].load(Ordering::SeqCst),
            }));
        }
        debug!(channel, group, claimed = readers.len(), "subscribed");
        Ok(readers)
    }
}

/// Reader over one claimed partition. Dropping it releases the claim.
#[derive(Debug)]
struct InMemoryPartitionReader {
    broker: Arc<Broker>,
    topic: Arc<Topic>,
    group: Arc<GroupState>,
    partition: u32,
    cursor: u64,
}

#[async_trait]
impl PartitionReader for InMemoryPartitionReader {
    fn channel(&self) -> &str {
        &self.topic.name
    }

    fn partition(&self) -> u32 {
        self.partition
    }

    async fn next_message(&mut self) -> Result<Option<Message>, ChannelError> {
        let topic = Arc::clone(&self.topic);
        let slot = &topic.partitions[self.partition as usize];
        loop {
            // Registered before checking so a publish in between is not missed.
            let appended = slot.appended.notified();
            if self.broker.is_closed() {
                return Ok(None);
            }
            let next = usize::try_from(self.cursor)
                .ok()
                .and_then(|index| read(&slot.records).get(index).cloned());
            if let Some(envelope) = next {
                let message = Message {
                    partition: self.partition,
                    offset: self.cursor,
                    envelope,
                };
                self.cursor += 1;
                return Ok(Some(message));
            }
            appended.await;
        }
    }

    async fn commit(&mut self, message: &Message) -> Result<(), ChannelError> {
        if message.partition == self.partition {
            self.group.committed[self.partition as usize]
                .fetch_max(message.offset + 1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for InMemoryPartitionReader {
    fn drop(&mut self) {
        self.group.claimed[self.partition as usize].store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::Utc;
    use socialnet_core::channel::names;
    use uuid::Uuid;

    use super::*;

    fn envelope(channel: &str, key: &str, seq: i64) -> EventEnvelope {
        EventEnvelope {
            event_id: Uuid::new_v4(),
            channel: channel.to_owned(),
            partition_key: key.to_owned(),
            payload: serde_json::json!({ "seq": seq }),
            headers: BTreeMap::new(),
            correlation_id: Uuid::new_v4(),
            causation_id: None,
            occurred_at: Utc::now(),
        }
    }

    async fn next(reader: &mut Box<dyn PartitionReader>) -> Message {
        tokio::time::timeout(Duration::from_secs(1), reader.next_message())
            .await
            .expect("timed out waiting for a record")
            .unwrap()
            .unwrap()
    }

    fn reader_for(
        readers: &mut [Box<dyn PartitionReader>],
        partition: u32,
    ) -> &mut Box<dyn PartitionReader> {
        readers
            .iter_mut()
            .find(|r| r.partition() == partition)
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_to_undeclared_channel_fails() {
        let channel = InMemoryChannel::new();

        let result = channel.publish(&envelope("nope", "1", 0)).await;

        assert!(matches!(result, Err(ChannelError::UnknownChannel(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn test_system_channels_declare_dead_letter_variants() {
        let channel = InMemoryChannel::with_system_channels();

        for name in names::ALL {
            assert_eq!(channel.partitions(name), Some(3));
            assert_eq!(channel.partitions(&dead_letter_channel(name)), Some(3));
        }
    }

    #[tokio::test]
    async fn test_same_key_records_keep_publish_order() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let mut positions = Vec::new();

        // Act
        for seq in 0..5 {
            positions.push(
                channel
                    .publish(&envelope(names::USER_DELETED, "7", seq))
                    .await
                    .unwrap(),
            );
        }

        // Assert
        let partition = positions[0].partition;
        assert!(positions.iter().all(|p| p.partition == partition));
        let offsets: Vec<u64> = positions.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
        let seqs: Vec<i64> = channel
            .partition_records(names::USER_DELETED, partition)
            .iter()
            .map(|e| e.payload["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_every_group_receives_every_record() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let position = channel
            .publish(&envelope(names::POST_DELETED, "3", 1))
            .await
            .unwrap();
        let mut likes = channel
            .subscribe(names::POST_DELETED, "like-service")
            .await
            .unwrap();
        let mut comments = channel
            .subscribe(names::POST_DELETED, "comment-service")
            .await
            .unwrap();

        // Act
        let a = next(reader_for(&mut likes, position.partition)).await;
        let b = next(reader_for(&mut comments, position.partition)).await;

        // Assert
        assert_eq!(a.envelope, b.envelope);
        assert_eq!(a.offset, 0);
    }

    #[tokio::test]
    async fn test_partitions_are_claimed_once_per_group() {
        let channel = InMemoryChannel::with_system_channels();

        let first = channel.subscribe(names::USER_DELETED, "g").await.unwrap();
        let second = channel.subscribe(names::USER_DELETED, "g").await.unwrap();
        drop(first);
        let third = channel.subscribe(names::USER_DELETED, "g").await.unwrap();

        assert_eq!(second.len(), 0);
        assert_eq!(third.len(), 3);
    }

    #[tokio::test]
    async fn test_uncommitted_record_is_redelivered_after_reader_drop() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let position = channel
            .publish(&envelope(names::COMMENT_DELETED, "5", 1))
            .await
            .unwrap();
        let mut readers = channel
            .subscribe(names::COMMENT_DELETED, "like-service")
            .await
            .unwrap();
        let first = next(reader_for(&mut readers, position.partition)).await;

        // Act: crash before commit.
        drop(readers);
        let mut readers = channel
            .subscribe(names::COMMENT_DELETED, "like-service")
            .await
            .unwrap();
        let again = next(reader_for(&mut readers, position.partition)).await;

        // Assert
        assert_eq!(first.envelope.event_id, again.envelope.event_id);
        assert_eq!(channel.lag(names::COMMENT_DELETED, "like-service"), 1);
    }

    #[tokio::test]
    async fn test_committed_record_is_not_redelivered() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let position = channel
            .publish(&envelope(names::COMMENT_DELETED, "5", 1))
            .await
            .unwrap();
        let mut readers = channel
            .subscribe(names::COMMENT_DELETED, "like-service")
            .await
            .unwrap();
        let reader = reader_for(&mut readers, position.partition);
        let message = next(reader).await;

        // Act
        reader.commit(&message).await.unwrap();
        drop(readers);
        channel
            .publish(&envelope(names::COMMENT_DELETED, "5", 2))
            .await
            .unwrap();
        let mut readers = channel
            .subscribe(names::COMMENT_DELETED, "like-service")
            .await
            .unwrap();
        let after = next(reader_for(&mut readers, position.partition)).await;

        // Assert
        assert_eq!(after.offset, 1);
        assert_eq!(after.envelope.payload["seq"], 2);
    }

    #[tokio::test]
    async fn test_reader_wakes_on_publish() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let key = "9";
        let partition = partition_for(key, 3);
        let mut readers = channel.subscribe(names::USER_DELETED, "g").await.unwrap();
        let mut reader = readers.remove(
            readers
                .iter()
                .position(|r| r.partition() == partition)
                .unwrap(),
        );
        let waiting = tokio::spawn(async move { reader.next_message().await });

        // Act
        tokio::task::yield_now().await;
        channel
            .publish(&envelope(names::USER_DELETED, key, 1))
            .await
            .unwrap();

        // Assert
        let message = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(message.envelope.partition_key, key);
    }

    #[tokio::test]
    async fn test_close_ends_readers_and_rejects_publishes() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let mut readers = channel.subscribe(names::USER_DELETED, "g").await.unwrap();
        let mut reader = readers.pop().unwrap();
        let waiting = tokio::spawn(async move { reader.next_message().await });
        tokio::task::yield_now().await;

        // Act
        channel.close();

        // Assert
        let ended = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(ended.is_none());
        let result = channel.publish(&envelope(names::USER_DELETED, "1", 1)).await;
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_is_drained_tracks_group_commits() {
        // Arrange
        let channel = InMemoryChannel::with_system_channels();
        let position = channel
            .publish(&envelope(names::MEDIA_DELETED, "1", 1))
            .await
            .unwrap();
        let mut readers = channel.subscribe(names::MEDIA_DELETED, "g").await.unwrap();
        assert!(!channel.is_drained());

        // Act
        let reader = reader_for(&mut readers, position.partition);
        let message = next(reader).await;
        reader.commit(&message).await.unwrap();

        // Assert
        assert!(channel.is_drained());
        assert_eq!(channel.lag(names::MEDIA_DELETED, "g"), 0);
        assert_eq!(channel.lag(names::MEDIA_DELETED, "never-subscribed"), 1);
    }
}
