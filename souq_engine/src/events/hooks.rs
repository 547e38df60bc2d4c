use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent, ReturnRefundedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub return_refunded_producer: Vec<EventProducer<ReturnRefundedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_return_refunded(&self, event: ReturnRefundedEvent) {
        for producer in &self.return_refunded_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_return_refunded: Option<EventHandler<ReturnRefundedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_return_refunded = hooks.on_return_refunded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_return_refunded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_return_refunded {
            result.return_refunded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_return_refunded {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_return_refunded: Option<Handler<ReturnRefundedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_return_refunded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReturnRefundedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_return_refunded = Some(Arc::new(f));
        self
    }
}
