//! Состояние дашборда с защитой от устаревших ответов.
//!
//! Каждая загрузка берет номер из возрастающей последовательности. Результат
//! становится примененным только если более новый результат еще не применен.
//! Ответ вызывающему от этого не зависит.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

static DASHBOARD_STATE: Lazy<DashboardState> = Lazy::new(DashboardState::new);

/// Общее состояние дашборда процесса
pub fn global() -> &'static DashboardState {
    &DASHBOARD_STATE
}

/// Номер загрузки
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket {
    pub sequence: u64,
}

pub struct DashboardState {
    next_sequence: AtomicU64,
    /// 0 - ничего не применено
    applied_sequence: AtomicU64,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            next_sequence: AtomicU64::new(1),
            applied_sequence: AtomicU64::new(0),
        }
    }

    /// Начать загрузку
    pub fn begin(&self) -> FetchTicket {
        FetchTicket {
            sequence: self.next_sequence.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Отметить загрузку как примененную.
    /// Возвращает `false`, если уже применена более новая загрузка.
    pub fn apply(&self, ticket: FetchTicket) -> bool {
        let previous = self
            .applied_sequence
            .fetch_max(ticket.sequence, Ordering::SeqCst);
        previous < ticket.sequence
    }

    /// Номер последней примененной загрузки
    pub fn applied_sequence(&self) -> Option<u64> {
        match self.applied_sequence.load(Ordering::SeqCst) {
            0 => None,
            sequence => Some(sequence),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_increasing() {
        let state = DashboardState::new();
        let first = state.begin();
        let second = state.begin();
        assert!(second > first);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let state = DashboardState::new();
        let older = state.begin();
        let newer = state.begin();

        assert!(state.apply(newer));
        assert!(!state.apply(older));
        assert_eq!(state.applied_sequence(), Some(newer.sequence));
    }

    #[test]
    fn test_results_in_order_are_applied() {
        let state = DashboardState::new();
        assert!(state.applied_sequence().is_none());

        let first = state.begin();
        assert!(state.apply(first));
        let second = state.begin();
        assert!(state.apply(second));
        assert_eq!(state.applied_sequence(), Some(second.sequence));
        assert!(!state.apply(second));
    }
}
