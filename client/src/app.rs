use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    ClipboardEvent, DragEvent, Event, FileReader, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlInputElement, KeyboardEvent, PointerEvent, ProgressEvent,
    WheelEvent, Window,
};

use stratboard_shared::DEFAULT_COLOR;

use crate::actions;
use crate::background::ImageSource;
use crate::config::ClientConfig;
use crate::dom::{create_element, init_logging, window_size, CanvasSurface};
use crate::net::{room_from_path, websocket_url};
use crate::render::{LoopControl, RenderLoop, StopHandle};
use crate::state::{Board, MAX_WIDTH, MIN_WIDTH};
use crate::sync::SyncChannel;
use crate::util::make_client_id;
use crate::ws::WsConnection;

const PAN_KEY: &str = "Space";

type SharedBoard = Rc<RefCell<Board>>;
type SharedSurface = Rc<RefCell<CanvasSurface>>;

pub struct Teardown {
    window: Window,
    render: StopHandle,
    frame_request: Rc<Cell<Option<i32>>>,
    sync_timer: i32,
    connection: Rc<WsConnection>,
}

impl Teardown {
    pub fn stop(&self) {
        self.render.stop();
        if let Some(id) = self.frame_request.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.window.clear_interval_with_handle(self.sync_timer);
        self.connection.shutdown();
        tracing::info!("board stopped");
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("Missing body"))?;

    let location = window.location();
    let config = ClientConfig::from_query(&location.search().unwrap_or_default());
    init_logging(config.debug);
    let room = room_from_path(&location.pathname().unwrap_or_default())
        .unwrap_or_else(|| config.room.clone());

    let (width, height) = window_size(&window);
    let board: SharedBoard = Rc::new(RefCell::new(Board::new(make_client_id(), width, height)));
    tracing::info!(
        id = %board.borrow().registry.local_id(),
        %room,
        sync_ms = config.sync_interval.as_millis() as u64,
        "joining board"
    );

    let canvas: HtmlCanvasElement = create_element(&document, "canvas")?;
    let _ = canvas.style().set_property("display", "block");
    let _ = canvas.style().set_property("touch-action", "none");
    body.append_child(&canvas)?;

    let surface: SharedSurface = Rc::new(RefCell::new(CanvasSurface::new(canvas.clone())?));

    install_pointer_handlers(&canvas, &board)?;
    install_window_handlers(&window, &board, &surface)?;
    install_toolbar(&document, &body, &board)?;

    let (render, frame_request) = start_render_loop(&window, board.clone(), surface)?;

    let sync = Rc::new(RefCell::new(SyncChannel::new(config.sync_interval)));
    let url = websocket_url(
        &location.protocol().unwrap_or_default(),
        &location.host().unwrap_or_default(),
        &room,
    );
    let connection = {
        let board = board.clone();
        let sync = sync.clone();
        WsConnection::connect(&window, url, move |payload| {
            sync.borrow_mut()
                .receive(&payload, &mut board.borrow_mut().registry);
        })
    };

    let sync_timer = {
        let board = board.clone();
        let sync = sync.clone();
        let connection = connection.clone();
        let ontick = Closure::<dyn FnMut()>::new(move || {
            sync.borrow_mut()
                .tick(&board.borrow().registry, &*connection);
        });
        let millis = i32::try_from(config.sync_interval.as_millis()).unwrap_or(i32::MAX);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            ontick.as_ref().unchecked_ref(),
            millis,
        )?;
        ontick.forget();
        handle
    };

    let teardown = Teardown {
        window: window.clone(),
        render,
        frame_request,
        sync_timer,
        connection,
    };
    {
        let onpagehide = Closure::<dyn FnMut(Event)>::new(move |_| teardown.stop());
        window.add_event_listener_with_callback("pagehide", onpagehide.as_ref().unchecked_ref())?;
        onpagehide.forget();
    }

    Ok(())
}

fn start_render_loop(
    window: &Window,
    board: SharedBoard,
    surface: SharedSurface,
) -> Result<(StopHandle, Rc<Cell<Option<i32>>>), JsValue> {
    let render = Rc::new(RefCell::new(RenderLoop::new()));
    let stop = render.borrow().stop_handle();
    let frame_request = Rc::new(Cell::new(None));
    let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

    {
        let callback_cb = callback.clone();
        let frame_request = frame_request.clone();
        let window = window.clone();
        *callback.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_: f64| {
            frame_request.set(None);
            let control = render
                .borrow_mut()
                .frame(&board.borrow(), &mut *surface.borrow_mut());
            if control == LoopControl::Stop {
                tracing::debug!(frames = render.borrow().frames(), "render loop finished");
                return;
            }
            if let Some(next) = callback_cb.borrow().as_ref() {
                if let Ok(id) = window.request_animation_frame(next.as_ref().unchecked_ref()) {
                    frame_request.set(Some(id));
                }
            }
        }));
    }

    if let Some(first) = callback.borrow().as_ref() {
        frame_request.set(Some(
            window.request_animation_frame(first.as_ref().unchecked_ref())?,
        ));
    }
    Ok((stop, frame_request))
}

fn install_pointer_handlers(canvas: &HtmlCanvasElement, board: &SharedBoard) -> Result<(), JsValue> {
    {
        let board = board.clone();
        let canvas_cb = canvas.clone();
        let onpointerdown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            if event.button() != 0 {
                return;
            }
            let _ = canvas_cb.set_pointer_capture(event.pointer_id());
            actions::pointer_down(
                &mut board.borrow_mut(),
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        });
        canvas.add_event_listener_with_callback(
            "pointerdown",
            onpointerdown.as_ref().unchecked_ref(),
        )?;
        onpointerdown.forget();
    }

    {
        let board = board.clone();
        let onpointermove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            actions::pointer_move(
                &mut board.borrow_mut(),
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        });
        canvas.add_event_listener_with_callback(
            "pointermove",
            onpointermove.as_ref().unchecked_ref(),
        )?;
        onpointermove.forget();
    }

    for name in ["pointerup", "pointercancel"] {
        let board = board.clone();
        let onpointerup = Closure::<dyn FnMut(PointerEvent)>::new(move |_| {
            actions::pointer_up(&mut board.borrow_mut());
        });
        canvas.add_event_listener_with_callback(name, onpointerup.as_ref().unchecked_ref())?;
        onpointerup.forget();
    }

    {
        let board = board.clone();
        let onwheel = Closure::<dyn FnMut(WheelEvent)>::new(move |event: WheelEvent| {
            event.prevent_default();
            let direction = -event.delta_y();
            if direction == 0.0 {
                return;
            }
            actions::wheel(
                &mut board.borrow_mut(),
                direction,
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            );
        });
        canvas.add_event_listener_with_callback("wheel", onwheel.as_ref().unchecked_ref())?;
        onwheel.forget();
    }

    Ok(())
}

fn install_window_handlers(
    window: &Window,
    board: &SharedBoard,
    surface: &SharedSurface,
) -> Result<(), JsValue> {
    {
        let board = board.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut()>::new(move || {
            let (width, height) = window_size(&window_cb);
            actions::resize(&mut board.borrow_mut(), width, height);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    for (name, held) in [("keydown", true), ("keyup", false)] {
        let board = board.clone();
        let onkey = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.code() != PAN_KEY {
                return;
            }
            if is_text_input(&event) {
                return;
            }
            event.prevent_default();
            actions::set_pan_modifier(&mut board.borrow_mut(), held);
        });
        window.add_event_listener_with_callback(name, onkey.as_ref().unchecked_ref())?;
        onkey.forget();
    }

    {
        let ondragover = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
        });
        window.add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())?;
        ondragover.forget();
    }

    {
        let board = board.clone();
        let surface = surface.clone();
        let ondrop = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let Some(file) = event
                .data_transfer()
                .and_then(|transfer| transfer.files())
                .and_then(|files| files.get(0))
            else {
                return;
            };
            if let Err(error) = read_dropped_file(file, board.clone(), surface.clone()) {
                tracing::warn!(?error, "could not read dropped file");
            }
        });
        window.add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())?;
        ondrop.forget();
    }

    {
        let board = board.clone();
        let surface = surface.clone();
        let onpaste = Closure::<dyn FnMut(ClipboardEvent)>::new(move |event: ClipboardEvent| {
            let Some(text) = event
                .clipboard_data()
                .and_then(|data| data.get_data("text").ok())
            else {
                return;
            };
            let source = actions::paste_text(&mut board.borrow_mut(), &text);
            if let Some(source) = source {
                if let Err(error) = show_background(&board, &surface, source) {
                    tracing::warn!(?error, "could not load pasted background");
                }
            }
        });
        window.add_event_listener_with_callback("paste", onpaste.as_ref().unchecked_ref())?;
        onpaste.forget();
    }

    Ok(())
}

fn read_dropped_file(
    file: web_sys::File,
    board: SharedBoard,
    surface: SharedSurface,
) -> Result<(), JsValue> {
    let reader = FileReader::new()?;
    let mime = file.type_();
    let onloadend = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
        let Some(bytes) = read_file_bytes(&event) else {
            tracing::warn!(%mime, "dropped file could not be read");
            return;
        };
        let source = actions::drop_file(&mut board.borrow_mut(), &mime, &bytes);
        if let Err(error) = show_background(&board, &surface, source) {
            tracing::warn!(?error, "could not load dropped background");
        }
    });
    reader.set_onloadend(Some(onloadend.as_ref().unchecked_ref()));
    onloadend.forget();
    reader.read_as_array_buffer(&file)
}

fn read_file_bytes(event: &ProgressEvent) -> Option<Vec<u8>> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    let buffer = reader.result().ok()?;
    if buffer.is_null() {
        return None;
    }
    Some(Uint8Array::new(&buffer).to_vec())
}

// Each source gets its own element so the visible one is only replaced
// once its successor has decoded.
fn show_background(
    board: &SharedBoard,
    surface: &SharedSurface,
    source: ImageSource,
) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;

    {
        let board = board.clone();
        let surface = surface.clone();
        let source = source.clone();
        let image_cb = image.clone();
        let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
            let width = f64::from(image_cb.natural_width());
            let height = f64::from(image_cb.natural_height());
            if actions::image_loaded(&mut board.borrow_mut(), &source, width, height) {
                surface.borrow_mut().set_background(image_cb.clone());
            }
        });
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        onload.forget();
    }

    {
        let board = board.clone();
        let source = source.clone();
        let onerror = Closure::<dyn FnMut(Event)>::new(move |_| {
            actions::image_failed(&mut board.borrow_mut(), &source);
        });
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    image.set_src(source.as_str());
    Ok(())
}

fn is_text_input(event: &KeyboardEvent) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
        .is_some_and(|input| input.type_() == "text")
}

fn install_toolbar(
    document: &web_sys::Document,
    body: &HtmlElement,
    board: &SharedBoard,
) -> Result<(), JsValue> {
    let toolbar: HtmlElement = create_element(document, "div")?;
    toolbar.set_class_name("toolbar");
    let style = toolbar.style();
    let _ = style.set_property("position", "fixed");
    let _ = style.set_property("top", "8px");
    let _ = style.set_property("left", "8px");
    let _ = style.set_property("display", "flex");
    let _ = style.set_property("gap", "8px");

    let width_input: HtmlInputElement = create_element(document, "input")?;
    width_input.set_type("range");
    width_input.set_min(&MIN_WIDTH.to_string());
    width_input.set_max(&MAX_WIDTH.to_string());
    width_input.set_step("1");
    width_input.set_value(&board.borrow().local_state().width.to_string());
    toolbar.append_child(&width_input)?;

    let color_input: HtmlInputElement = create_element(document, "input")?;
    color_input.set_type("color");
    color_input.set_value(DEFAULT_COLOR);
    toolbar.append_child(&color_input)?;

    let reset_button: HtmlButtonElement = create_element(document, "button")?;
    reset_button.set_text_content(Some("Reset"));
    toolbar.append_child(&reset_button)?;

    body.append_child(&toolbar)?;

    {
        let board = board.clone();
        let width_input_cb = width_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Ok(width) = width_input_cb.value().parse::<u32>() {
                actions::set_width(&mut board.borrow_mut(), width);
            }
        });
        width_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let board = board.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            actions::set_color(&mut board.borrow_mut(), &color_input_cb.value());
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let board = board.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            actions::reset(&mut board.borrow_mut());
        });
        reset_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    Ok(())
}
