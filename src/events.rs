/// A minimal synchronous publish/subscribe channel. Subscribers run in
/// subscription order, on the publisher's stack.
pub struct EventBus<E> {
	subscribers: Vec<Box<dyn FnMut(&E)>>,
}

impl<E> EventBus<E> {
	pub fn new() -> EventBus<E> {
		EventBus {
			subscribers: Vec::new(),
		}
	}

	pub fn subscribe(&mut self, subscriber: impl FnMut(&E) + 'static) {
		self.subscribers.push(Box::new(subscriber));
	}

	pub fn publish(&mut self, event: E) {
		for subscriber in &mut self.subscribers {
			subscriber(&event);
		}
	}
}

impl<E> Default for EventBus<E> {
	fn default() -> Self {
		EventBus::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::shared::share;

	#[test]
	fn test_subscribers_see_every_event_in_order() {
		let seen = share(Vec::new());
		let mut bus = EventBus::new();
		bus.subscribe({
			let seen = seen.clone();
			move |event: &u32| seen.borrow_mut().push(*event)
		});
		bus.subscribe({
			let seen = seen.clone();
			move |event: &u32| seen.borrow_mut().push(event * 10)
		});
		bus.publish(1);
		bus.publish(2);
		assert_eq!(*seen.borrow(), vec![1, 10, 2, 20]);
	}
}
