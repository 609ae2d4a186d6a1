use async_trait::async_trait;
use parking_lot::Mutex;
use push_extension_core::error::{BroadcastError, ComponentError};
use push_extension_core::registry::{
    Capability, Component, ComponentsPool, Eventable, Pushable, ScreenVisit, TrackedEvent,
};
use std::sync::Arc;

/// Event-reporting component that logs every call into a shared journal
struct AnalyticsComponent {
    name: String,
    reject: Option<&'static str>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl AnalyticsComponent {
    fn new(name: &str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reject: None,
            journal: journal.clone(),
        })
    }

    fn rejecting(name: &str, reason: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reject: Some(reason),
            journal: journal.clone(),
        })
    }

    fn log(&self, entry: impl std::fmt::Display) {
        self.journal.lock().push(format!("{}:{entry}", self.name));
    }
}

impl Component for AnalyticsComponent {
    fn component_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Eventable for AnalyticsComponent {
    async fn set_user_id(&self, user_id: Option<&str>) {
        self.log(format!("user={}", user_id.unwrap_or("anonymous")));
    }

    async fn report(&self, event: &TrackedEvent) -> Result<(), ComponentError> {
        self.log(&event.name);
        match self.reject {
            Some(reason) => Err(ComponentError::new(reason)),
            None => Ok(()),
        }
    }

    async fn report_screen_event(&self, visit: &ScreenVisit) -> Result<(), ComponentError> {
        self.log(format!("screen={}", visit.screen_name));
        Ok(())
    }

    async fn dispatch_now(&self) {
        self.log("flush");
    }
}

/// Push-only component
struct MessagingComponent {
    journal: Arc<Mutex<Vec<String>>>,
}

impl Component for MessagingComponent {
    fn component_name(&self) -> &str {
        "messaging"
    }
}

#[async_trait]
impl Pushable for MessagingComponent {
    async fn did_register_device_token(&self, token: &[u8]) {
        self.journal.lock().push(format!("messaging:token_len={}", token.len()));
    }

    async fn perform_registration(&self) {
        self.journal.lock().push("messaging:register".to_string());
    }

    async fn subscribe_to_topic(&self, topic: &str) {
        self.journal.lock().push(format!("messaging:+{topic}"));
    }

    async fn unsubscribe_from_topic(&self, topic: &str) {
        self.journal.lock().push(format!("messaging:-{topic}"));
    }
}

#[tokio::test]
async fn test_zero_components_invokes_nothing_and_succeeds() {
    let pool = Arc::new(ComponentsPool::new());

    assert_eq!(pool.broadcast_report(&TrackedEvent::new("open")).await, Ok(0));
    assert_eq!(
        pool.broadcast_screen_event(&ScreenVisit::new("home")).await,
        Ok(0)
    );
    pool.set_user_id(Some("user-1")).await;
    pool.did_register_device_token(&[0xde, 0xad]).await;
    assert!(!pool.is_running(Capability::PushRegistration));
}

#[tokio::test]
async fn test_second_of_three_failing_aborts_before_third() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pool = ComponentsPool::new();
    pool.register_eventable(AnalyticsComponent::new("first", &journal))
        .register_eventable(AnalyticsComponent::rejecting("second", "rate limited", &journal))
        .register_eventable(AnalyticsComponent::new("third", &journal));
    let pool = Arc::new(pool);

    let result = pool
        .broadcast_report(&TrackedEvent::new("purchase").with_property("amount", 42))
        .await;

    assert_eq!(
        result,
        Err(BroadcastError::ComponentFailed {
            component: "second".to_string(),
            call: "report".to_string(),
            reason: "rate limited".to_string(),
        })
    );
    assert_eq!(*journal.lock(), vec!["first:purchase", "second:purchase"]);
}

#[tokio::test]
async fn test_infallible_broadcasts_reach_every_component_in_order() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pool = ComponentsPool::new();
    pool.register_eventable(AnalyticsComponent::new("first", &journal))
        .register_eventable(AnalyticsComponent::new("second", &journal))
        .register_pushable(Arc::new(MessagingComponent {
            journal: journal.clone(),
        }));
    let pool = Arc::new(pool);

    pool.set_user_id(None).await;
    pool.dispatch_now().await;
    pool.subscribe_to_topic("offers").await;
    pool.unsubscribe_from_topic("offers").await;

    assert_eq!(
        *journal.lock(),
        vec![
            "first:user=anonymous",
            "second:user=anonymous",
            "first:flush",
            "second:flush",
            "messaging:+offers",
            "messaging:-offers",
        ]
    );
}

#[tokio::test]
async fn test_shared_pool_broadcasts_from_many_tasks() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut pool = ComponentsPool::new();
    pool.register_eventable(AnalyticsComponent::new("only", &journal));
    let pool = Arc::new(pool);

    let mut handles = Vec::new();
    for i in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            pool.broadcast_report(&TrackedEvent::new(format!("event_{i}")))
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(1));
    }

    assert_eq!(journal.lock().len(), 10);
}
