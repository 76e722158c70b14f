//! NSWindow creation and the delegate handling resize snapping, focus, and
//! close requests.

use std::cell::RefCell;
use std::rc::Weak;

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool, NSObject};
use objc2::{declare_class, msg_send, msg_send_id, mutability, ClassType, DeclaredClass};
use objc2_app_kit::{NSBackingStoreType, NSWindow, NSWindowStyleMask};
use objc2_foundation::{
    CGFloat, MainThreadMarker, NSNotification, NSPoint, NSRect, NSSize, NSString,
};

use ttk_core::SystemEvent;

use super::screen::{dispatch_event, RenderState};

/// Create the native window sized to `cols`×`rows` cells.
pub(crate) fn create_window(
    title: &str,
    content_width: f64,
    content_height: f64,
    mtm: MainThreadMarker,
) -> Retained<NSWindow> {
    let content_rect = NSRect::new(
        NSPoint::new(0.0, 0.0),
        NSSize::new(content_width as CGFloat, content_height as CGFloat),
    );
    let style = NSWindowStyleMask::Titled
        | NSWindowStyleMask::Closable
        | NSWindowStyleMask::Miniaturizable
        | NSWindowStyleMask::Resizable;

    let window = unsafe {
        NSWindow::initWithContentRect_styleMask_backing_defer(
            mtm.alloc(),
            content_rect,
            style,
            NSBackingStoreType::NSBackingStoreBuffered,
            false,
        )
    };

    window.setTitle(&NSString::from_str(title));

    // Dark background so the window never flashes white before first paint
    unsafe {
        use objc2::runtime::AnyClass;
        let bg: Retained<AnyObject> = msg_send_id![
            AnyClass::get("NSColor").expect("NSColor class must exist"),
            colorWithRed: 0.0_f64,
            green: 0.0_f64,
            blue: 0.0_f64,
            alpha: 1.0_f64
        ];
        let _: () = msg_send![&window, setBackgroundColor: &*bg];
    }

    window.center();
    window
}

// ──────────────────────────────────────────────
// Window delegate
// ──────────────────────────────────────────────

pub(crate) struct TtkWindowDelegateIvars {
    state: Weak<RefCell<RenderState>>,
}

declare_class!(
    pub(crate) struct TtkWindowDelegate;

    unsafe impl ClassType for TtkWindowDelegate {
        type Super = NSObject;
        type Mutability = mutability::MainThreadOnly;
        const NAME: &'static str = "TtkWindowDelegate";
    }

    impl DeclaredClass for TtkWindowDelegate {
        type Ivars = TtkWindowDelegateIvars;
    }

    unsafe impl TtkWindowDelegate {
        #[method(windowShouldClose:)]
        fn window_should_close(&self, _sender: &AnyObject) -> Bool {
            // The application decides what closing means; it sees the event
            // and calls shutdown() itself.
            self.dispatch(SystemEvent::Close);
            Bool::NO
        }

        #[method(windowDidBecomeKey:)]
        fn window_did_become_key(&self, _notification: &NSNotification) {
            self.dispatch(SystemEvent::FocusGained);
        }

        #[method(windowDidResignKey:)]
        fn window_did_resign_key(&self, _notification: &NSNotification) {
            self.dispatch(SystemEvent::FocusLost);
        }

        /// During a manual drag the OS snaps the frame to whole cells; a
        /// misaligned frame is snapped down once at drag start.
        #[method(windowWillStartLiveResize:)]
        fn window_will_start_live_resize(&self, notification: &NSNotification) {
            let Some(state) = self.ivars().state.upgrade() else {
                return;
            };
            let metrics = state.borrow().metrics;
            let Some(window) = window_from_notification(notification) else {
                return;
            };
            unsafe {
                let increments = NSSize::new(metrics.char_width, metrics.char_height);
                let _: () = msg_send![&*window, setContentResizeIncrements: increments];

                if let Some(view) = window.contentView() {
                    let bounds = view.bounds();
                    let (snap_w, snap_h) =
                        metrics.snap_size(bounds.size.width, bounds.size.height);
                    if (bounds.size.width - snap_w).abs() > 0.5
                        || (bounds.size.height - snap_h).abs() > 0.5
                    {
                        let _: () =
                            msg_send![&*window, setContentSize: NSSize::new(snap_w, snap_h)];
                    }
                }
            }
        }

        /// Drop the increments after the drag so maximize, split view, and
        /// edge snapping are unconstrained.
        #[method(windowDidEndLiveResize:)]
        fn window_did_end_live_resize(&self, notification: &NSNotification) {
            let Some(window) = window_from_notification(notification) else {
                return;
            };
            unsafe {
                let _: () = msg_send![&*window, setContentResizeIncrements: NSSize::new(1.0, 1.0)];
            }
        }

        #[method(windowDidResize:)]
        fn window_did_resize(&self, notification: &NSNotification) {
            let Some(state_rc) = self.ivars().state.upgrade() else {
                return;
            };
            let Some(window) = window_from_notification(notification) else {
                return;
            };
            let Some(view) = window.contentView() else {
                return;
            };
            let bounds = view.bounds();

            let (rows, cols, changed) = {
                let mut state = state_rc.borrow_mut();
                let (rows, cols) =
                    state.metrics.grid_size(bounds.size.width, bounds.size.height);
                let changed = (rows, cols) != state.grid.dimensions();
                if changed {
                    state.grid.resize(rows, cols);
                    let (r, c) = (rows, cols);
                    state.cursor.clamp(r, c);
                }
                state.offset = state.metrics.centering_offset(
                    bounds.size.width,
                    bounds.size.height,
                    rows,
                    cols,
                );
                state.dirty.mark_all(rows, cols);
                (rows, cols, changed)
            };

            unsafe { view.setNeedsDisplay(true) };
            if changed {
                dispatch_event(&state_rc, |h| {
                    h.on_system_event(&SystemEvent::Resize { rows, cols })
                });
            }
        }
    }
);

impl TtkWindowDelegate {
    pub(crate) fn new(
        state: Weak<RefCell<RenderState>>,
        mtm: MainThreadMarker,
    ) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(TtkWindowDelegateIvars { state });
        unsafe { msg_send_id![super(this), init] }
    }

    fn dispatch(&self, event: SystemEvent) {
        if let Some(state) = self.ivars().state.upgrade() {
            dispatch_event(&state, |h| h.on_system_event(&event));
        }
    }
}

fn window_from_notification(notification: &NSNotification) -> Option<Retained<NSWindow>> {
    unsafe {
        let object = notification.object()?;
        let window: Retained<NSWindow> = msg_send_id![&*object, self];
        Some(window)
    }
}
