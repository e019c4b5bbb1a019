use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket, Window};

use crate::sync::{ReconnectBackoff, Transport, TransportError};

type MessageHandler = Box<dyn FnMut(String)>;

pub struct WsConnection {
    url: String,
    window: Window,
    socket: RefCell<Option<WebSocket>>,
    handlers: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
    backoff: RefCell<ReconnectBackoff>,
    on_message: RefCell<MessageHandler>,
    shut_down: Cell<bool>,
}

impl Transport for WsConnection {
    fn is_open(&self) -> bool {
        self.socket
            .borrow()
            .as_ref()
            .is_some_and(|socket| socket.ready_state() == WebSocket::OPEN)
    }

    fn send(&self, payload: &str) -> Result<(), TransportError> {
        let socket = self.socket.borrow();
        let socket = socket.as_ref().ok_or(TransportError::Closed)?;
        socket
            .send_with_str(payload)
            .map_err(|error| TransportError::Send(format!("{error:?}")))
    }
}

impl WsConnection {
    pub fn connect(
        window: &Window,
        url: String,
        on_message: impl FnMut(String) + 'static,
    ) -> Rc<Self> {
        let connection = Rc::new(Self {
            url,
            window: window.clone(),
            socket: RefCell::new(None),
            handlers: RefCell::new(Vec::new()),
            backoff: RefCell::new(ReconnectBackoff::default()),
            on_message: RefCell::new(Box::new(on_message)),
            shut_down: Cell::new(false),
        });
        Self::open(&connection);
        connection
    }

    pub fn shutdown(&self) {
        self.shut_down.set(true);
        if let Some(socket) = self.socket.borrow().as_ref() {
            let _ = socket.close();
        }
    }

    fn open(this: &Rc<Self>) {
        if this.shut_down.get() {
            return;
        }
        let socket = match WebSocket::new(&this.url) {
            Ok(socket) => socket,
            Err(error) => {
                tracing::warn!(url = %this.url, ?error, "websocket could not be created");
                Self::schedule_reconnect(this);
                return;
            }
        };

        let weak = Rc::downgrade(this);
        let mut handlers = Vec::new();

        let onopen = handler(&weak, |connection, _| {
            connection.backoff.borrow_mut().reset();
            tracing::info!(url = %connection.url, "connected");
        });
        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        handlers.push(onopen);

        let onmessage = handler(&weak, |connection, event| {
            let Ok(event) = event.dyn_into::<MessageEvent>() else {
                return;
            };
            match event.data().as_string() {
                Some(text) => (connection.on_message.borrow_mut())(text),
                None => tracing::warn!("ignoring non-text websocket message"),
            }
        });
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        handlers.push(onmessage);

        let onerror = handler(&weak, |connection, _| {
            tracing::warn!(url = %connection.url, "websocket error");
        });
        socket.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        handlers.push(onerror);

        let onclose = handler(&weak, |connection, event| {
            let code = event.dyn_ref::<CloseEvent>().map(CloseEvent::code);
            tracing::warn!(url = %connection.url, ?code, "disconnected");
            Self::schedule_reconnect(connection);
        });
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        handlers.push(onclose);

        // Reopen runs from a timer, never from inside one of the old handlers,
        // so dropping them here is safe.
        if let Some(previous) = this.socket.replace(Some(socket)) {
            previous.set_onclose(None);
            let _ = previous.close();
        }
        *this.handlers.borrow_mut() = handlers;
    }

    fn schedule_reconnect(this: &Rc<Self>) {
        if this.shut_down.get() {
            return;
        }
        let delay = this.backoff.borrow_mut().next_delay();
        let attempt = this.backoff.borrow().attempt();
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting");

        let weak = Rc::downgrade(this);
        let ontimeout = Closure::once_into_js(move || {
            if let Some(connection) = weak.upgrade() {
                Self::open(&connection);
            }
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(error) = this
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(ontimeout.unchecked_ref(), millis)
        {
            tracing::error!(?error, "failed to schedule reconnect");
        }
    }
}

fn handler(
    weak: &Weak<WsConnection>,
    mut callback: impl FnMut(&Rc<WsConnection>, JsValue) + 'static,
) -> Closure<dyn FnMut(JsValue)> {
    let weak = weak.clone();
    Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        if let Some(connection) = weak.upgrade() {
            callback(&connection, event);
        }
    })
}
