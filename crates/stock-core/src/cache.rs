//! TTL 기반 메모이제이션 캐시.
//!
//! 값 계산 결과를 키별로 저장하고, 저장 시점으로부터 `ttl`이 지나기 전까지
//! 복제본을 반환합니다. 크기 제한이나 별도의 만료 정리는 없으며, 오래된
//! 항목은 다음 조회 시 재계산되어 덮어써집니다.
//!
//! 시간 측정에 tokio 시계를 사용하므로 `start_paused` 테스트에서
//! `tokio::time::advance`로 만료를 재현할 수 있습니다.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// 캐시 키.
///
/// 함수 이름, 위치 인자, 키워드 인자로 구성됩니다. 키워드 인자는
/// `BTreeMap`에 보관되므로 삽입 순서와 무관하게 같은 키가 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    function: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// 위치 인자를 추가합니다.
    pub fn arg(mut self, value: impl Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// 키워드 인자를 추가합니다. `None`은 `"None"`으로 기록됩니다.
    pub fn kwarg(mut self, name: impl Into<String>, value: Option<impl Display>) -> Self {
        let value = value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "None".to_string());
        self.kwargs.insert(name.into(), value);
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.function)?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(arg)?;
            first = false;
        }
        for (name, value) in &self.kwargs {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
            first = false;
        }
        f.write_str(")")
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// TTL 캐시.
///
/// 모든 연산은 하나의 `Mutex` 임계 구역 안에서 조회/갱신합니다.
/// 여러 핸들러가 공유할 때는 `Arc<TtlCache<_, _>>`로 보관합니다.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // 캐시 내용은 항상 일관된 상태이므로 poison 여부는 무시
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 유효한 항목이 있으면 복제본을 반환합니다.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.lock();
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// 값을 저장하고 저장 시각을 갱신합니다.
    pub fn insert(&self, key: K, value: V) {
        self.lock().insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// 유효한 항목이 있으면 반환하고, 없거나 만료되었으면 `f`로 계산해 저장합니다.
    pub fn get_or_insert_with<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                return entry.value.clone();
            }
        }

        let value = f();
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// 비동기 계산 버전. 계산 중에는 락을 잡지 않습니다.
    ///
    /// 계산이 실패하면 에러를 그대로 반환하고 아무것도 저장하지 않습니다.
    /// 같은 키를 동시에 요청하면 계산이 중복될 수 있으며, 나중에 끝난 값이 남습니다.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = f().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// 모든 항목을 제거합니다.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish()
    }
}
