use crate::error::GenerationError;
use crate::logger;
use crate::models::{Items, LearningMode, TARGET_ITEM_COUNT};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Tickets are unique for the whole process, since every controller shares one event channel.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one generation request. Events carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    fn next() -> Self {
        Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Ticket(raw)
    }
}

#[derive(Debug)]
pub enum GenerationEvent {
    Partial {
        ticket: Ticket,
        count: usize,
    },
    Finished {
        ticket: Ticket,
        result: Result<Items, GenerationError>,
    },
}

impl GenerationEvent {
    pub fn ticket(&self) -> Ticket {
        match self {
            GenerationEvent::Partial { ticket, .. } | GenerationEvent::Finished { ticket, .. } => {
                *ticket
            }
        }
    }
}

/// Where a running generator reports how many items have streamed in so far.
#[derive(Debug, Clone)]
pub struct PartialSink {
    ticket: Ticket,
    tx: UnboundedSender<GenerationEvent>,
}

impl PartialSink {
    pub fn new(ticket: Ticket, tx: UnboundedSender<GenerationEvent>) -> Self {
        Self { ticket, tx }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn report(&self, count: usize) {
        // Receiver gone means the app is shutting down.
        let _ = self.tx.send(GenerationEvent::Partial {
            ticket: self.ticket,
            count,
        });
    }

    pub fn finish(&self, result: Result<Items, GenerationError>) {
        let _ = self.tx.send(GenerationEvent::Finished {
            ticket: self.ticket,
            result,
        });
    }
}

#[derive(Debug)]
pub enum Accepted {
    Ignored,
    Progress(usize),
    Completed(Items),
    Failed(GenerationError),
}

#[derive(Debug)]
struct InFlight {
    ticket: Ticket,
    mode: LearningMode,
    partial_count: usize,
    handle: Option<JoinHandle<()>>,
}

/// Tracks the single generation request whose results may still change session state.
#[derive(Debug, Default)]
pub struct GenerationSession {
    in_flight: Option<InFlight>,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a request for `mode`. Returns `None` when that mode is
    /// already being generated; any other in-flight request is aborted.
    pub fn begin(&mut self, mode: LearningMode) -> Option<Ticket> {
        if let Some(current) = &self.in_flight
            && current.mode == mode
        {
            return None;
        }
        self.cancel();

        let ticket = Ticket::next();
        self.in_flight = Some(InFlight {
            ticket,
            mode,
            partial_count: 0,
            handle: None,
        });
        Some(ticket)
    }

    /// Associates the spawned task with the current request so it can be aborted.
    pub fn attach(&mut self, ticket: Ticket, handle: JoinHandle<()>) {
        match &mut self.in_flight {
            Some(current) if current.ticket == ticket => current.handle = Some(handle),
            _ => handle.abort(),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            logger::log(&format!(
                "Cancelling generation {:?} for {}",
                previous.ticket,
                previous.mode.label()
            ));
            if let Some(handle) = previous.handle {
                handle.abort();
            }
        }
    }

    pub fn accept(&mut self, event: GenerationEvent) -> Accepted {
        let Some(current) = &mut self.in_flight else {
            logger::log(&format!("Dropping stale generation event {:?}", event.ticket()));
            return Accepted::Ignored;
        };
        if current.ticket != event.ticket() {
            logger::log(&format!("Dropping stale generation event {:?}", event.ticket()));
            return Accepted::Ignored;
        }

        match event {
            GenerationEvent::Partial { count, .. } => {
                current.partial_count = current.partial_count.max(count);
                Accepted::Progress(current.partial_count)
            }
            GenerationEvent::Finished { result, .. } => {
                self.in_flight = None;
                match result {
                    Ok(items) => Accepted::Completed(items),
                    Err(e) => Accepted::Failed(e),
                }
            }
        }
    }

    pub fn ticket(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|f| f.ticket)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn loading_mode(&self) -> Option<LearningMode> {
        self.in_flight.as_ref().map(|f| f.mode)
    }

    pub fn partial_count(&self) -> usize {
        self.in_flight.as_ref().map_or(0, |f| f.partial_count)
    }

    pub fn progress_percent(&self) -> u16 {
        progress_percent(self.partial_count())
    }

    pub fn status_line(&self) -> String {
        status_line(self.partial_count())
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take()
            && let Some(handle) = in_flight.handle
        {
            handle.abort();
        }
    }
}

pub fn progress_percent(partial_count: usize) -> u16 {
    (partial_count.min(TARGET_ITEM_COUNT) * 100 / TARGET_ITEM_COUNT) as u16
}

pub fn status_line(partial_count: usize) -> String {
    if partial_count == 0 {
        "Analyzing…".to_string()
    } else {
        format!(
            "Generating item {} of {}",
            (partial_count + 1).min(TARGET_ITEM_COUNT),
            TARGET_ITEM_COUNT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flashcard, TargetSchema};

    fn cards(n: usize) -> Items {
        Items::Flashcards(
            (0..n)
                .map(|i| Flashcard {
                    question: format!("q{}", i),
                    answer: format!("a{}", i),
                })
                .collect(),
        )
    }

    #[test]
    fn test_progress_saturates() {
        assert_eq!(progress_percent(0), 0);
        assert_eq!(progress_percent(2), 25);
        assert_eq!(progress_percent(8), 100);
        assert_eq!(progress_percent(12), 100);
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(0), "Analyzing…");
        assert_eq!(status_line(1), "Generating item 2 of 8");
        assert_eq!(status_line(7), "Generating item 8 of 8");
        assert_eq!(status_line(9), "Generating item 8 of 8");
    }

    #[test]
    fn test_begin_same_mode_is_noop() {
        let mut session = GenerationSession::new();
        assert!(session.begin(LearningMode::Quiz).is_some());
        assert!(session.begin(LearningMode::Quiz).is_none());
        assert!(session.is_loading());
        assert_eq!(session.loading_mode(), Some(LearningMode::Quiz));
    }

    #[test]
    fn test_partial_counts_are_monotonic() {
        let mut session = GenerationSession::new();
        let ticket = session.begin(LearningMode::Flashcards).unwrap();
        session.accept(GenerationEvent::Partial { ticket, count: 3 });
        let accepted = session.accept(GenerationEvent::Partial { ticket, count: 2 });
        assert!(matches!(accepted, Accepted::Progress(3)));
        assert_eq!(session.progress_percent(), 37);
    }

    #[test]
    fn test_stale_ticket_is_ignored_after_switch() {
        let mut session = GenerationSession::new();
        let old = session.begin(LearningMode::Flashcards).unwrap();
        let new = session.begin(LearningMode::Quiz).unwrap();
        assert_ne!(old, new);

        let stale = session.accept(GenerationEvent::Finished {
            ticket: old,
            result: Ok(cards(8)),
        });
        assert!(matches!(stale, Accepted::Ignored));
        assert!(session.is_loading());

        let fresh = session.accept(GenerationEvent::Finished {
            ticket: new,
            result: Ok(Items::empty(TargetSchema::Quiz)),
        });
        assert!(matches!(fresh, Accepted::Completed(Items::Quiz(_))));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_tickets_are_unique_across_sessions() {
        let mut first = GenerationSession::new();
        let mut second = GenerationSession::new();
        let a = first.begin(LearningMode::Flashcards).unwrap();
        let b = second.begin(LearningMode::Flashcards).unwrap();
        assert_ne!(a, b);
        assert_eq!(second.ticket(), Some(b));

        let accepted = second.accept(GenerationEvent::Finished {
            ticket: a,
            result: Ok(cards(5)),
        });
        assert!(matches!(accepted, Accepted::Ignored));
        assert!(second.is_loading());
    }

    #[test]
    fn test_failure_clears_loading() {
        let mut session = GenerationSession::new();
        let ticket = session.begin(LearningMode::Match).unwrap();
        let accepted = session.accept(GenerationEvent::Finished {
            ticket,
            result: Err(GenerationError::Api("boom".to_string())),
        });
        assert!(matches!(accepted, Accepted::Failed(GenerationError::Api(_))));
        assert!(!session.is_loading());
        assert_eq!(session.status_line(), "Analyzing…");
    }

    #[test]
    fn test_events_after_cancel_are_ignored() {
        let mut session = GenerationSession::new();
        let ticket = session.begin(LearningMode::Flashcards).unwrap();
        session.cancel();
        let accepted = session.accept(GenerationEvent::Partial { ticket, count: 1 });
        assert!(matches!(accepted, Accepted::Ignored));
    }

    #[tokio::test]
    async fn test_attach_with_stale_ticket_aborts_task() {
        let mut session = GenerationSession::new();
        let stale = session.begin(LearningMode::Flashcards).unwrap();
        session.begin(LearningMode::Quiz).unwrap();

        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });
        let abort = handle.abort_handle();
        session.attach(stale, handle);
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(abort.is_finished());
    }
}
