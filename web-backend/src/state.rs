use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use pipeaudit_core::{HttpScanClient, ScanService, Session, Settings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "pipeaudit_session";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub scanner: Arc<dyn ScanService>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        // 初始化扫描服务客户端
        let client = HttpScanClient::new(&settings.scanner_url, settings.timeout())
            .map_err(|e| anyhow::anyhow!("Failed to build scan client: {}", e))?
            .with_legacy_upload(settings.legacy_upload);
        tracing::info!(
            "{} at {} ({})",
            client.name(),
            client.base_url(),
            if settings.legacy_upload { "multipart upload" } else { "json" }
        );

        Ok(Self::with_scanner(settings, Arc::new(client)))
    }

    pub fn with_scanner(settings: Settings, scanner: Arc<dyn ScanService>) -> Self {
        let sessions = SessionStore::new(settings.session_ttl(), settings.max_sessions);
        Self {
            settings: Arc::new(settings),
            scanner,
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }

    pub fn new_session(&self) -> Session {
        Session::new(self.settings.snippet_radius).with_upload_limit(self.settings.max_upload_bytes)
    }
}

struct Entry {
    session: Session,
    last_seen: Instant,
}

/// 内存中的会话表，空闲超过 ttl 的会话被回收，数量超过上限时淘汰最久未访问的
pub struct SessionStore {
    entries: HashMap<String, Entry>,
    ttl: Duration,
    /// 0 为不限制
    capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 只查找已有会话，不创建
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.get_mut_at(id, Instant::now())
    }

    pub fn get_or_insert_with(&mut self, id: &str, make: impl FnOnce() -> Session) -> &mut Session {
        self.get_or_insert_with_at(id, Instant::now(), make)
    }

    fn expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_seen) > self.ttl
    }

    fn get_mut_at(&mut self, id: &str, now: Instant) -> Option<&mut Session> {
        let expired = self.expired(self.entries.get(id)?, now);
        if expired {
            tracing::debug!("Session {} expired", id);
            self.entries.remove(id);
            return None;
        }

        let entry = self.entries.get_mut(id)?;
        entry.last_seen = now;
        Some(&mut entry.session)
    }

    fn get_or_insert_with_at(
        &mut self,
        id: &str,
        now: Instant,
        make: impl FnOnce() -> Session,
    ) -> &mut Session {
        if self.get_mut_at(id, now).is_none() {
            self.sweep(now);
            self.make_room();
        }

        let entry = self.entries.entry(id.to_string()).or_insert_with(|| Entry {
            session: make(),
            last_seen: now,
        });
        entry.last_seen = now;
        &mut entry.session
    }

    fn sweep(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!("Swept {} idle sessions", removed);
        }
    }

    fn make_room(&mut self) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else { break };
            tracing::debug!("Session table full, evicting {}", oldest);
            self.entries.remove(&oldest);
        }
    }
}

/// 请求所属的会话 id
pub struct SessionKey {
    pub id: String,
    /// 新分配的 id，需要在响应里下发 cookie
    pub fresh: bool,
}

impl SessionKey {
    pub fn from_request(req: &HttpRequest) -> Self {
        match req.cookie(SESSION_COOKIE) {
            Some(cookie) if uuid::Uuid::parse_str(cookie.value()).is_ok() => Self {
                id: cookie.value().to_string(),
                fresh: false,
            },
            _ => Self {
                id: uuid::Uuid::new_v4().to_string(),
                fresh: true,
            },
        }
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, self.id.clone())
            .path("/")
            .http_only(true)
            .finish()
    }
}
