//! Behavioural tests for actuation requests served over TCP.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use netact_config::StatusMode;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

use crate::client::ActuationClient;
use crate::dispatch::{Action, Echo, PayloadType, ResponseEnvelope, rules};
use crate::service::NetworkActuation;
use crate::transport::{ActuationListener, ShutdownToken};

struct DispatchWorld {
    service: Option<NetworkActuation>,
    shutdown: ShutdownToken,
    server: Option<JoinHandle<()>>,
    address: Option<SocketAddr>,
    client: Option<ActuationClient>,
    sent: Vec<Value>,
    replies: Vec<ResponseEnvelope>,
}

impl DispatchWorld {
    fn new() -> Self {
        Self {
            service: Some(NetworkActuation::default().with_host("127.0.0.1")),
            shutdown: ShutdownToken::new(),
            server: None,
            address: None,
            client: None,
            sent: Vec::new(),
            replies: Vec::new(),
        }
    }

    fn service_mut(&mut self) -> &mut NetworkActuation {
        self.service
            .as_mut()
            .expect("slots are registered before the first request")
    }

    /// Starts the listener on first use so that every `Given` step can still
    /// register actuators and rules.
    fn client(&mut self) -> &mut ActuationClient {
        if self.client.is_none() {
            let service = self.service.take().expect("service not yet started");
            let listener = service.bind(Some(0)).expect("bind listener");
            let address = listener.local_addr();
            let shutdown = self.shutdown.clone();
            self.server = Some(thread::spawn(move || service.serve(listener, &shutdown)));
            self.address = Some(address);
            self.client = Some(
                ActuationClient::connect("127.0.0.1", address.port()).expect("connect client"),
            );
        }
        self.client.as_mut().expect("client connected")
    }

    fn send(&mut self, document: Value) {
        let reply = self.client().send(&document).expect("exchange request");
        self.sent.push(document);
        self.replies.push(reply);
    }

    fn request(&mut self, action: Action, payload: Value) {
        self.send(json!({"action": action.as_str(), "payload": payload}));
    }

    fn send_raw(&mut self, line: &str) {
        let reply = self.client().send_raw(line).expect("exchange request");
        self.sent.push(Value::Null);
        self.replies.push(reply);
    }

    fn reply(&self, position: usize) -> &ResponseEnvelope {
        self.replies
            .get(position - 1)
            .unwrap_or_else(|| panic!("no reply {position}: {:?}", self.replies))
    }

    fn last_reply(&self) -> &ResponseEnvelope {
        self.replies.last().expect("at least one reply")
    }

    fn payload_of(&self, position: usize) -> Value {
        self.sent
            .get(position - 1)
            .and_then(|document| document.get("payload"))
            .cloned()
            .expect("request carried a payload")
    }

    fn stop(&mut self) {
        self.client = None;
        self.shutdown.cancel();
        if let Some(server) = self.server.take() {
            server.join().expect("join listener");
        }
    }
}

impl Drop for DispatchWorld {
    fn drop(&mut self) {
        self.client = None;
        self.shutdown.cancel();
        if let Some(server) = self.server.take() {
            let _ = server.join();
        }
    }
}

fn assert_error(reply: &ResponseEnvelope, expected: &str) {
    let message = reply
        .error_message()
        .unwrap_or_else(|| panic!("expected an error reply, got {reply:?}"));
    assert!(
        message.starts_with(expected),
        "expected '{expected}', got '{message}'"
    );
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("an endpoint whose do slot accepts booleans")]
fn given_boolean_do(world: &RefCell<DispatchWorld>) {
    world
        .borrow_mut()
        .service_mut()
        .register_do(Echo, Some(PayloadType::Boolean), Vec::new());
}

#[given("an endpoint in typed status mode whose do slot accepts booleans")]
fn given_typed_boolean_do(world: &RefCell<DispatchWorld>) {
    let mut world = world.borrow_mut();
    let service = world.service.take().expect("service not yet started");
    world.service = Some(service.with_status_mode(StatusMode::Typed));
    world
        .service_mut()
        .register_do(Echo, Some(PayloadType::Boolean), Vec::new());
}

#[given("an endpoint whose setpoint slot accepts numbers below 10")]
fn given_bounded_setpoint(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().service_mut().register_setpoint(
        Echo,
        Some(PayloadType::Number),
        vec![rules::boxed(rules::less_than(10.0))],
    );
}

#[given("the setpoint slot also requires numbers above 0")]
fn given_lower_bound(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().service_mut().register_setpoint(
        Echo,
        None,
        vec![rules::boxed(rules::greater_than(0.0))],
    );
}

#[when("a do request with a boolean payload is sent")]
fn when_boolean_do(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().request(Action::Do, json!(true));
}

#[when("a do request with a string payload is sent")]
fn when_string_do(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().request(Action::Do, json!("testing"));
}

#[when("a setpoint request with payload {value} is sent")]
fn when_numeric_setpoint(world: &RefCell<DispatchWorld>, value: i64) {
    world.borrow_mut().request(Action::Setpoint, json!(value));
}

#[when("a setpoint request with a string payload is sent")]
fn when_string_setpoint(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().request(Action::Setpoint, json!("warm"));
}

#[when("a request without an action is sent")]
fn when_missing_action(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().send(json!({"payload": true}));
}

#[when("a request without a payload is sent")]
fn when_missing_payload(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().send(json!({"action": "do"}));
}

#[when("a request for an unknown action is sent")]
fn when_unknown_action(world: &RefCell<DispatchWorld>) {
    world
        .borrow_mut()
        .send(json!({"action": "reboot", "payload": true}));
}

#[when("a malformed request is sent")]
fn when_malformed(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().send_raw("not valid json");
}

#[when("the endpoint is stopped")]
fn when_stopped(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().stop();
}

#[then("the reply echoes the payload")]
fn then_echoes(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    let position = world.replies.len();
    assert_eq!(world.last_reply().response, world.payload_of(position));
}

#[then("reply {position} echoes its payload")]
fn then_reply_echoes(world: &RefCell<DispatchWorld>, position: usize) {
    let world = world.borrow();
    assert_eq!(world.reply(position).response, world.payload_of(position));
}

#[then("the reply status is {status}")]
fn then_status(world: &RefCell<DispatchWorld>, status: u16) {
    assert_eq!(world.borrow().last_reply().status, status);
}

#[then("the reply reports a ruleset violation")]
fn then_ruleset_violation(world: &RefCell<DispatchWorld>) {
    assert_error(
        world.borrow().last_reply(),
        "Payload does not comply with ruleset",
    );
}

#[then("reply {position} reports a ruleset violation")]
fn then_reply_ruleset_violation(world: &RefCell<DispatchWorld>, position: usize) {
    assert_error(
        world.borrow().reply(position),
        "Payload does not comply with ruleset",
    );
}

#[then("the reply reports a missing action")]
fn then_missing_action(world: &RefCell<DispatchWorld>) {
    assert_error(world.borrow().last_reply(), "No action declared");
}

#[then("the reply reports a missing payload")]
fn then_missing_payload(world: &RefCell<DispatchWorld>) {
    assert_error(world.borrow().last_reply(), "No target object specified");
}

#[then("the reply reports an invalid action")]
fn then_invalid_action(world: &RefCell<DispatchWorld>) {
    assert_error(world.borrow().last_reply(), "Not a valid action");
}

#[then("the reply reports an unbound slot")]
fn then_unbound_slot(world: &RefCell<DispatchWorld>) {
    assert_error(
        world.borrow().last_reply(),
        "No function registered for action 'setpoint'",
    );
}

#[then("the reply reports a rule evaluation failure")]
fn then_rule_evaluation(world: &RefCell<DispatchWorld>) {
    assert_error(world.borrow().last_reply(), "Rule 1 could not evaluate payload");
}

#[then("the first reply reports malformed JSON")]
fn then_first_malformed(world: &RefCell<DispatchWorld>) {
    assert_error(world.borrow().reply(1), "Request is not valid JSON");
}

#[then("its port can be bound again")]
fn then_port_released(world: &RefCell<DispatchWorld>) {
    let address = world.borrow().address.expect("endpoint was started");
    let rebound = ActuationListener::bind("127.0.0.1", address.port());
    assert!(rebound.is_ok(), "port still held: {rebound:?}");
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A boolean do request is echoed"
)]
fn boolean_do_is_echoed(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A payload of the wrong type is refused"
)]
fn wrong_type_is_refused(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A request without an action is refused"
)]
fn missing_action_is_refused(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A request without a payload is refused"
)]
fn missing_payload_is_refused(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "An unknown action is refused"
)]
fn unknown_action_is_refused(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A slot without an actuator is reported"
)]
fn unbound_slot_is_reported(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "Malformed JSON does not stop the listener"
)]
fn malformed_json_is_survived(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "Rules accumulate across registrations"
)]
fn rules_accumulate(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "A rule that cannot judge the payload is reported"
)]
fn rule_evaluation_is_reported(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "Typed status mode reports per-kind statuses"
)]
fn typed_status_mode(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/actuation_dispatch.feature",
    name = "Stopping the endpoint releases its port"
)]
fn stopping_releases_port(world: RefCell<DispatchWorld>) {
    drop(world);
}
