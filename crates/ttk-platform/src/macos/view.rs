//! TtkView: NSView subclass hosting the character grid.
//!
//! Paints frame plans in drawRect, translates keyboard and mouse input, and
//! implements NSTextInputClient so IME composition (marked text) renders at
//! the cursor without ever entering the grid. The view holds only a weak
//! reference back to the render state; the screen owns it.

use std::cell::RefCell;
use std::rc::Weak;

use core_graphics::context::CGContext;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool, Sel};
use objc2::{declare_class, msg_send, msg_send_id, mutability, ClassType, DeclaredClass};
use objc2_app_kit::{NSEvent, NSEventModifierFlags, NSTextInputClient, NSView};
use objc2_foundation::{
    MainThreadMarker, NSArray, NSAttributedString, NSNotFound, NSPoint, NSRange, NSRect, NSSize,
    NSString,
};

use ttk_core::width;
use ttk_core::{
    CellRect, CharEvent, KeyCode, KeyEvent, Modifiers, MouseAction, MouseButton, MouseEvent,
};
use ttk_renderer::{cursor_overlay, plan_frame, plan_marked_text};

use super::draw;
use super::screen::{dispatch_event, RenderState};

// ──────────────────────────────────────────────
// TtkView — NSView subclass
// ──────────────────────────────────────────────

pub(crate) struct TtkViewIvars {
    state: Weak<RefCell<RenderState>>,
}

declare_class!(
    pub(crate) struct TtkView;

    unsafe impl ClassType for TtkView {
        type Super = NSView;
        type Mutability = mutability::MainThreadOnly;
        const NAME: &'static str = "TtkView";
    }

    impl DeclaredClass for TtkView {
        type Ivars = TtkViewIvars;
    }

    // ── NSView overrides ──

    unsafe impl TtkView {
        #[method(acceptsFirstResponder)]
        fn accepts_first_responder(&self) -> Bool {
            Bool::YES
        }

        #[method(isOpaque)]
        fn is_opaque(&self) -> Bool {
            Bool::YES
        }

        #[method(drawRect:)]
        fn draw_rect(&self, dirty_rect: NSRect) {
            let Some(state) = self.ivars().state.upgrade() else {
                return;
            };
            let Ok(mut state) = state.try_borrow_mut() else {
                return;
            };
            let state = &mut *state;
            let rows = state.grid.rows();
            let cols = state.grid.cols();
            if rows == 0 || cols == 0 {
                return;
            }

            let Some(ctx) = current_cg_context() else {
                return;
            };

            // Union the view-reported rect with the regions the screen
            // accumulated through refresh()/refresh_region().
            let mut region =
                cells_for_pixel_rect(dirty_rect, state.metrics, state.offset, rows, cols);
            if let Some(pending) = state.dirty.take() {
                region = Some(match region {
                    Some(r) => r.union(pending),
                    None => pending,
                });
            }
            let Some(region) = region.and_then(|r| r.clamp_to(rows, cols)) else {
                return;
            };

            draw::erase_region(&ctx, &mut state.caches, region, state.metrics, state.offset, rows);
            let plan = plan_frame(&state.grid, &state.pairs, region);
            draw::draw_frame(
                &ctx,
                &plan,
                &state.fonts,
                &mut state.caches,
                state.metrics,
                state.offset,
                rows,
            );
            if let Some(overlay) = cursor_overlay(&state.cursor, &state.grid) {
                draw::draw_cursor(&ctx, overlay, state.metrics, state.offset, rows);
            }
            if let Some(overlay) = plan_marked_text(&state.marked) {
                draw::draw_marked_text(
                    &ctx,
                    &overlay,
                    state.cursor.row,
                    state.cursor.col,
                    &state.fonts,
                    &mut state.caches,
                    state.metrics,
                    state.offset,
                    rows,
                );
            }
        }

        // ── Keyboard ──

        #[method(keyDown:)]
        fn key_down(&self, event: &NSEvent) {
            let (code, modifiers) = key_and_modifiers_from_event(event);
            let text = match code {
                KeyCode::Char(_) if !modifiers.suppresses_text() => unsafe {
                    event.characters().map(|s| s.to_string()).filter(|s| !s.is_empty())
                },
                _ => None,
            };
            let key = KeyEvent { code, modifiers, text };

            let consumed = self.with_state(|state| dispatch_event(state, |h| h.on_key_event(&key)));
            if consumed {
                return;
            }
            // Unconsumed keys go to the text input subsystem, which either
            // commits characters (insertText) or updates the composition
            // (setMarkedText). Ctrl/Cmd/Alt chords never produce text.
            if modifiers.suppresses_text() {
                return;
            }
            unsafe {
                let events = NSArray::from_slice(&[event]);
                let _: () = msg_send![self, interpretKeyEvents: &*events];
            }
        }

        // ── Mouse ──

        #[method(mouseDown:)]
        fn mouse_down(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Left, MouseAction::Press);
        }

        #[method(mouseUp:)]
        fn mouse_up(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Left, MouseAction::Release);
        }

        #[method(rightMouseDown:)]
        fn right_mouse_down(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Right, MouseAction::Press);
        }

        #[method(rightMouseUp:)]
        fn right_mouse_up(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Right, MouseAction::Release);
        }

        #[method(otherMouseDown:)]
        fn other_mouse_down(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Middle, MouseAction::Press);
        }

        #[method(otherMouseUp:)]
        fn other_mouse_up(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Middle, MouseAction::Release);
        }

        #[method(mouseDragged:)]
        fn mouse_dragged(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Left, MouseAction::Move);
        }

        #[method(mouseMoved:)]
        fn mouse_moved(&self, event: &NSEvent) {
            self.deliver_mouse(event, MouseButton::Other(0), MouseAction::Move);
        }
    }

    // ── NSTextInputClient ──

    unsafe impl NSTextInputClient for TtkView {
        #[method(insertText:replacementRange:)]
        fn insert_text_replacement_range(
            &self,
            string: &AnyObject,
            _replacement_range: NSRange,
        ) {
            let text = nsstring_from_anyobject(string);
            self.with_state(|state| {
                state.borrow_mut().marked.clear();
                true
            });
            for (grapheme, _) in width::clusters(&text) {
                let event = CharEvent { grapheme: grapheme.to_string() };
                self.with_state(|state| dispatch_event(state, |h| h.on_char_event(&event)));
            }
            self.refresh_composition_region();
        }

        #[method(setMarkedText:selectedRange:replacementRange:)]
        fn set_marked_text_selected_range_replacement_range(
            &self,
            string: &AnyObject,
            selected_range: NSRange,
            _replacement_range: NSRange,
        ) {
            let text = nsstring_from_anyobject(string);
            self.with_state(|state| {
                let mut state = state.borrow_mut();
                if text.is_empty() {
                    state.marked.clear();
                } else {
                    let location = if selected_range.location == NSNotFound as usize {
                        0
                    } else {
                        selected_range.location
                    };
                    state.marked.set(text.clone(), (location, selected_range.length));
                }
                true
            });
            self.refresh_composition_region();
        }

        #[method(unmarkText)]
        fn unmark_text(&self) {
            self.with_state(|state| {
                state.borrow_mut().marked.clear();
                true
            });
            self.refresh_composition_region();
        }

        #[method(hasMarkedText)]
        fn has_marked_text(&self) -> Bool {
            let marked = self.with_state(|state| !state.borrow().marked.is_empty());
            if marked {
                Bool::YES
            } else {
                Bool::NO
            }
        }

        #[method(markedRange)]
        fn marked_range(&self) -> NSRange {
            let length = self.with_state(|state| {
                state.borrow().marked.text.encode_utf16().count()
            });
            if length == 0 {
                NSRange::new(NSNotFound as usize, 0)
            } else {
                NSRange::new(0, length)
            }
        }

        #[method(selectedRange)]
        fn selected_range(&self) -> NSRange {
            let (length, selected) = self.with_state(|state| {
                let state = state.borrow();
                (state.marked.text.encode_utf16().count(), state.marked.selected)
            });
            if length == 0 {
                NSRange::new(NSNotFound as usize, 0)
            } else {
                NSRange::new(selected.0, selected.1)
            }
        }

        #[method_id(attributedSubstringForProposedRange:actualRange:)]
        fn attributed_substring_for_proposed_range(
            &self,
            _range: NSRange,
            _actual_range: *mut NSRange,
        ) -> Option<Retained<NSAttributedString>> {
            None
        }

        #[method_id(validAttributesForMarkedText)]
        fn valid_attributes_for_marked_text(&self) -> Retained<NSArray<NSString>> {
            NSArray::new()
        }

        #[method(firstRectForCharacterRange:actualRange:)]
        fn first_rect_for_character_range(
            &self,
            _range: NSRange,
            _actual_range: *mut NSRange,
        ) -> NSRect {
            let cursor_rect = self.with_state_default(
                NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(1.0, 16.0)),
                |state| {
                    let state = state.borrow();
                    let rows = state.grid.rows();
                    NSRect::new(
                        NSPoint::new(
                            state.metrics.pixel_x(state.cursor.col, state.offset.0),
                            state.metrics.pixel_y(state.cursor.row, rows, state.offset.1),
                        ),
                        NSSize::new(state.metrics.char_width, state.metrics.char_height),
                    )
                },
            );
            unsafe {
                let window: Option<Retained<objc2_app_kit::NSWindow>> =
                    msg_send_id![self, window];
                if let Some(window) = window {
                    let window_rect: NSRect = msg_send![
                        self,
                        convertRect: cursor_rect,
                        toView: std::ptr::null::<NSView>()
                    ];
                    return window.convertRectToScreen(window_rect);
                }
            }
            cursor_rect
        }

        #[method(characterIndexForPoint:)]
        fn character_index_for_point(&self, _point: NSPoint) -> usize {
            NSNotFound as usize
        }

        #[method(doCommandBySelector:)]
        fn do_command_by_selector(&self, _selector: Sel) {
            // The raw key event was already delivered through on_key_event
            // before reaching the input context; swallowing the selector
            // here prevents the system beep without double delivery.
        }
    }
);

impl TtkView {
    pub(crate) fn new(state: Weak<RefCell<RenderState>>, mtm: MainThreadMarker) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(TtkViewIvars { state });
        unsafe { msg_send_id![super(this), init] }
    }

    fn with_state<R: Default>(&self, f: impl FnOnce(&std::rc::Rc<RefCell<RenderState>>) -> R) -> R {
        match self.ivars().state.upgrade() {
            Some(state) => f(&state),
            None => R::default(),
        }
    }

    fn with_state_default<R>(
        &self,
        default: R,
        f: impl FnOnce(&std::rc::Rc<RefCell<RenderState>>) -> R,
    ) -> R {
        match self.ivars().state.upgrade() {
            Some(state) => f(&state),
            None => default,
        }
    }

    fn deliver_mouse(&self, event: &NSEvent, button: MouseButton, action: MouseAction) {
        let Some(cell) = self.mouse_cell(event) else {
            return;
        };
        let mouse = MouseEvent { x: cell.1, y: cell.0, button, action };
        self.with_state(|state| dispatch_event(state, |h| h.on_mouse_event(&mouse)));
    }

    /// Cell `(row, col)` under the event, or `None` outside the grid.
    fn mouse_cell(&self, event: &NSEvent) -> Option<(i32, i32)> {
        let point = unsafe { event.locationInWindow() };
        let local: NSPoint = unsafe {
            msg_send![self, convertPoint: point, fromView: std::ptr::null::<NSView>()]
        };
        self.with_state_default(None, |state| {
            let state = state.borrow();
            let rows = state.grid.rows();
            let cols = state.grid.cols();
            if rows == 0 || cols == 0 {
                return None;
            }
            let col = ((local.x - state.offset.0) / state.metrics.char_width).floor() as i64;
            let from_bottom =
                ((local.y - state.offset.1) / state.metrics.char_height).floor() as i64;
            let row = rows as i64 - 1 - from_bottom;
            if row < 0 || row >= rows as i64 || col < 0 || col >= cols as i64 {
                return None;
            }
            Some((row as i32, col as i32))
        })
    }

    /// Mark the cursor row dirty and schedule a repaint; the composition
    /// overlay is anchored there.
    fn refresh_composition_region(&self) {
        self.with_state(|state| {
            let mut state = state.borrow_mut();
            let rows = state.grid.rows();
            let cols = state.grid.cols();
            if rows > 0 && cols > 0 {
                let row = state.cursor.row.min(rows - 1);
                state.dirty.mark(CellRect::new(row, 0, 1, cols));
            }
            true
        });
        unsafe { self.setNeedsDisplay(true) };
    }
}

fn current_cg_context() -> Option<CGContext> {
    let ctx = unsafe {
        let cls = objc2::runtime::AnyClass::get("NSGraphicsContext")
            .expect("NSGraphicsContext class must exist");
        let ns_ctx: Option<Retained<AnyObject>> = msg_send_id![cls, currentContext];
        ns_ctx.and_then(|ns_ctx| {
            let ptr: *mut core_graphics::sys::CGContext = msg_send![&*ns_ctx, CGContext];
            if ptr.is_null() {
                None
            } else {
                Some(CGContext::from_existing_context_ptr(ptr))
            }
        })
    };
    if ctx.is_none() {
        // transient: the frame is dropped, the next display cycle repaints
        log::warn!("drawRect called without a graphics context");
    }
    ctx
}

/// Convert a view rect (bottom-left origin) to the covered cell rectangle.
fn cells_for_pixel_rect(
    rect: NSRect,
    metrics: ttk_renderer::CellMetrics,
    offset: (f64, f64),
    rows: usize,
    cols: usize,
) -> Option<CellRect> {
    let col0 = ((rect.origin.x - offset.0) / metrics.char_width).floor() as i64;
    let col1 = ((rect.origin.x + rect.size.width - offset.0) / metrics.char_width).ceil() as i64;
    let bottom = ((rect.origin.y - offset.1) / metrics.char_height).floor() as i64;
    let top = ((rect.origin.y + rect.size.height - offset.1) / metrics.char_height).ceil() as i64;
    let row0 = rows as i64 - top;
    let row1 = rows as i64 - bottom;
    CellRect::from_signed(
        row0.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        col0.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        (row1 - row0).clamp(0, i64::from(i32::MAX)) as i32,
        (col1 - col0).clamp(0, i64::from(i32::MAX)) as i32,
        rows,
        cols,
    )
}

// ──────────────────────────────────────────────
// Key mapping
// ──────────────────────────────────────────────

/// Printable characters of the ANSI layout indexed by hardware keycode
/// (0x00-0x32); NUL marks slots that belong to non-printable keys. Used for
/// modifier chords, where the event's produced character is unreliable.
const ANSI_PRINTABLE: [char; 0x33] = [
    // 0x00-0x0F
    'a', 's', 'd', 'f', 'h', 'g', 'z', 'x', 'c', 'v', '\0', 'b', 'q', 'w', 'e', 'r',
    // 0x10-0x1F
    'y', 't', '1', '2', '3', '4', '6', '5', '=', '9', '7', '-', '8', '0', ']', 'o',
    // 0x20-0x2F
    'u', '[', 'i', 'p', '\0', 'l', 'j', '\'', 'k', ';', '\\', ',', '/', 'n', 'm', '.',
    // 0x30-0x32
    '\0', ' ', '`',
];

pub(super) fn key_from_keycode(keycode: u16) -> KeyCode {
    if let Some(&c) = ANSI_PRINTABLE.get(usize::from(keycode)) {
        if c != '\0' {
            return KeyCode::Char(c);
        }
    }
    match keycode {
        0x24 => KeyCode::Enter,
        0x30 => KeyCode::Tab,
        0x33 => KeyCode::Backspace,
        0x35 => KeyCode::Escape,
        0x72 => KeyCode::Insert,
        0x73 => KeyCode::Home,
        0x74 => KeyCode::PageUp,
        0x75 => KeyCode::Delete,
        0x77 => KeyCode::End,
        0x79 => KeyCode::PageDown,
        0x7B => KeyCode::Left,
        0x7C => KeyCode::Right,
        0x7D => KeyCode::Down,
        0x7E => KeyCode::Up,
        other => function_key(other).unwrap_or(KeyCode::Char('?')),
    }
}

/// Function keys occupy scattered keycodes with no arithmetic relation to
/// their number.
fn function_key(keycode: u16) -> Option<KeyCode> {
    let n = match keycode {
        0x7A => 1,
        0x78 => 2,
        0x63 => 3,
        0x76 => 4,
        0x60 => 5,
        0x61 => 6,
        0x62 => 7,
        0x64 => 8,
        0x65 => 9,
        0x6D => 10,
        0x67 => 11,
        0x6F => 12,
        _ => return None,
    };
    Some(KeyCode::F(n))
}

pub(super) fn key_and_modifiers_from_event(event: &NSEvent) -> (KeyCode, Modifiers) {
    let keycode = unsafe { event.keyCode() };
    let flags = unsafe { event.modifierFlags() };
    let modifiers = modifiers_from_flags(flags);

    if modifiers.suppresses_text() {
        return (key_from_keycode(keycode), modifiers);
    }

    // Prefer the produced character so shifted/alternate layouts map
    // correctly; fall back to the hardware keycode table.
    let key = unsafe {
        event.characters().and_then(|s| {
            let s = s.to_string();
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(KeyCode::Char(c)),
                _ => None,
            }
        })
    };

    (key.unwrap_or_else(|| key_from_keycode(keycode)), modifiers)
}

pub(super) fn modifiers_from_flags(flags: NSEventModifierFlags) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if flags.contains(NSEventModifierFlags::NSEventModifierFlagShift) {
        modifiers |= Modifiers::SHIFT;
    }
    if flags.contains(NSEventModifierFlags::NSEventModifierFlagControl) {
        modifiers |= Modifiers::CONTROL;
    }
    if flags.contains(NSEventModifierFlags::NSEventModifierFlagOption) {
        modifiers |= Modifiers::ALT;
    }
    if flags.contains(NSEventModifierFlags::NSEventModifierFlagCommand) {
        modifiers |= Modifiers::COMMAND;
    }
    modifiers
}

/// Extract a Rust String from an ObjC object that is either NSString or
/// NSAttributedString. insertText: and setMarkedText: can receive either.
pub(super) fn nsstring_from_anyobject(obj: &AnyObject) -> String {
    unsafe {
        let nsstring_cls = NSString::class();
        let is_string: Bool = msg_send![obj, isKindOfClass: nsstring_cls];
        if is_string.as_bool() {
            let s = &*(obj as *const AnyObject as *const NSString);
            return s.to_string();
        }
        let s: Retained<NSString> = msg_send_id![obj, string];
        s.to_string()
    }
}
