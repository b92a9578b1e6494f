use std::collections::VecDeque;

pub const DEFAULT_TTL_MS: f64 = 5_000.0;
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn accent(self) -> &'static str {
        match self {
            Self::Info => "#3498db",
            Self::Success => "#27ae60",
            Self::Warning => "#f39c12",
            Self::Error => "#e74c3c",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at_ms: f64,
    pub ttl_ms: f64,
}

impl Notification {
    pub fn expires_at_ms(&self) -> f64 {
        self.created_at_ms + self.ttl_ms
    }
}

/// Bounded toast queue. Pushing never fails; the oldest entry makes room.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    entries: VecDeque<Notification>,
    capacity: usize,
    next_id: u64,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>, now_ms: f64) -> u64 {
        self.push_with_ttl(level, message, now_ms, DEFAULT_TTL_MS)
    }

    pub fn push_with_ttl(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now_ms: f64,
        ttl_ms: f64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Notification {
            id,
            level,
            message: message.into(),
            created_at_ms: now_ms,
            ttl_ms: if ttl_ms.is_finite() && ttl_ms > 0.0 {
                ttl_ms
            } else {
                DEFAULT_TTL_MS
            },
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    /// Drop everything past its TTL. Returns how many were removed.
    pub fn expire(&mut self, now_ms: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|n| n.expires_at_ms() > now_ms);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
