// C FFI shim over the capella capability client.
//
// Opaque client pointer, u64 container handles and device ids, numeric
// condition codes as return values. Every entry point null-checks its
// pointers, traces a span, and bumps a call counter.
//
// Tracing: span 'capi' with field api_func.
// Metric: per-group call counters, snapshot via capi_metrics_snapshot().

#![allow(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_safety_doc
)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use capella::{
    CapClient, CapId, CapValue, ContainerHandle, ContainerKind, DeviceId, ElementKind,
    FrameComponent, OpClass, PrimitiveType, Rounding, Transport,
};
use capella_error::{CapError, ConditionCode};

// ── Condition codes ─────────────────────────────────────────────────

pub const CAPELLA_OK: c_int = ConditionCode::Ok as c_int;
pub const CAPELLA_GENERIC: c_int = ConditionCode::Generic as c_int;
pub const CAPELLA_LOWMEMORY: c_int = ConditionCode::LowMemory as c_int;
pub const CAPELLA_BADCONTAINER: c_int = ConditionCode::BadContainer as c_int;
pub const CAPELLA_MISMATCH: c_int = ConditionCode::Mismatch as c_int;
pub const CAPELLA_BOUNDS: c_int = ConditionCode::Bounds as c_int;
pub const CAPELLA_BADVALUE: c_int = ConditionCode::BadValue as c_int;
pub const CAPELLA_UNKNOWNTYPE: c_int = ConditionCode::UnknownType as c_int;
pub const CAPELLA_UNSUPPORTED: c_int = ConditionCode::Unsupported as c_int;
pub const CAPELLA_BADDEVICE: c_int = ConditionCode::BadDevice as c_int;
pub const CAPELLA_REJECTED: c_int = ConditionCode::Rejected as c_int;
pub const CAPELLA_NOTFOUND: c_int = ConditionCode::NotFound as c_int;
pub const CAPELLA_MISUSE: c_int = ConditionCode::Misuse as c_int;

/// Sentinel for "no explicit primitive type" in negotiation calls.
pub const CAPELLA_TYPE_DEFAULT: u8 = 0xff;
/// Sentinel for "no explicit container kind" in negotiation calls.
pub const CAPELLA_KIND_DEFAULT: u8 = 0;

// ── Metrics ─────────────────────────────────────────────────────────

static CAPI_CLIENT: AtomicU64 = AtomicU64::new(0);
static CAPI_DEVICE: AtomicU64 = AtomicU64::new(0);
static CAPI_CONTAINER: AtomicU64 = AtomicU64::new(0);
static CAPI_ELEMENT: AtomicU64 = AtomicU64::new(0);
static CAPI_CAPABILITY: AtomicU64 = AtomicU64::new(0);
static CAPI_RANGE: AtomicU64 = AtomicU64::new(0);
static CAPI_FRAME: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct CapiMetricsSnapshot {
    pub client: u64,
    pub device: u64,
    pub container: u64,
    pub element: u64,
    pub capability: u64,
    pub range: u64,
    pub frame: u64,
}

impl CapiMetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.client
            + self.device
            + self.container
            + self.element
            + self.capability
            + self.range
            + self.frame
    }
}

pub fn capi_metrics_snapshot() -> CapiMetricsSnapshot {
    CapiMetricsSnapshot {
        client: CAPI_CLIENT.load(Ordering::Relaxed),
        device: CAPI_DEVICE.load(Ordering::Relaxed),
        container: CAPI_CONTAINER.load(Ordering::Relaxed),
        element: CAPI_ELEMENT.load(Ordering::Relaxed),
        capability: CAPI_CAPABILITY.load(Ordering::Relaxed),
        range: CAPI_RANGE.load(Ordering::Relaxed),
        frame: CAPI_FRAME.load(Ordering::Relaxed),
    }
}

pub fn reset_capi_metrics() {
    CAPI_CLIENT.store(0, Ordering::Relaxed);
    CAPI_DEVICE.store(0, Ordering::Relaxed);
    CAPI_CONTAINER.store(0, Ordering::Relaxed);
    CAPI_ELEMENT.store(0, Ordering::Relaxed);
    CAPI_CAPABILITY.store(0, Ordering::Relaxed);
    CAPI_RANGE.store(0, Ordering::Relaxed);
    CAPI_FRAME.store(0, Ordering::Relaxed);
}

// ── Transport registration ──────────────────────────────────────────

type BoxedTransport = Box<dyn Transport + Send>;

static PENDING_TRANSPORT: Mutex<Option<BoxedTransport>> = Mutex::new(None);

/// Stage a transport for the next `capella_client_new` call.
///
/// C callers cannot construct a Rust transport, so the embedding (or a
/// test harness) registers one here before handing control to C code.
pub fn register_transport(transport: BoxedTransport) {
    if let Ok(mut slot) = PENDING_TRANSPORT.lock() {
        *slot = Some(transport);
    }
}

// ── Opaque handle ───────────────────────────────────────────────────

/// Opaque capability client handle exposed via C FFI.
///
/// Wraps a `CapClient` plus the last error message for
/// `capella_last_error`.
pub struct Capella {
    client: CapClient,
    last_error: Mutex<CString>,
}

impl Capella {
    fn new(client: CapClient) -> Self {
        Self {
            client,
            last_error: Mutex::new(CString::default()),
        }
    }

    fn set_error(&self, err: &CapError) {
        if let Ok(c) = CString::new(err.to_string()) {
            if let Ok(mut guard) = self.last_error.lock() {
                *guard = c;
            }
        }
    }
}

fn error_to_code(err: &CapError) -> c_int {
    err.condition_code() as c_int
}

fn kind_from_bit(bit: u8) -> Option<ContainerKind> {
    ContainerKind::ALL.into_iter().find(|k| k.bit() == bit)
}

/// Record an error on the client and return its condition code.
fn fail(handle: &Capella, err: &CapError) -> c_int {
    handle.set_error(err);
    error_to_code(err)
}

// ── Client lifecycle ────────────────────────────────────────────────

/// Create a capability client from the transport staged via
/// [`register_transport`]. Returns null if none is staged.
///
/// # Safety
/// The returned pointer must be released with `capella_client_free`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_client_new() -> *mut Capella {
    CAPI_CLIENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "client_new").entered();

    let transport = PENDING_TRANSPORT.lock().ok().and_then(|mut s| s.take());
    match transport {
        Some(t) => Box::into_raw(Box::new(Capella::new(CapClient::new(t)))),
        None => {
            tracing::warn!(target: "capella.capi", "client_new without a staged transport");
            std::ptr::null_mut()
        }
    }
}

/// Release a client. Null is a no-op.
///
/// # Safety
/// `client` must have come from `capella_client_new` and must not be used
/// after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_client_free(client: *mut Capella) {
    CAPI_CLIENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "client_free").entered();
    if !client.is_null() {
        drop(Box::from_raw(client));
    }
}

/// Copy the last error message into `buf` (always null-terminated,
/// truncated to `buf_len - 1` bytes).
///
/// # Safety
/// `buf` must point to at least `buf_len` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_last_error(
    client: *const Capella,
    buf: *mut c_char,
    buf_len: usize,
) -> c_int {
    if client.is_null() || buf.is_null() || buf_len == 0 {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Ok(guard) = handle.last_error.lock() else {
        return CAPELLA_GENERIC;
    };
    let bytes = guard.as_bytes();
    let n = bytes.len().min(buf_len - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buf, n);
    *buf.add(n) = 0;
    CAPELLA_OK
}

// ── Device sessions ─────────────────────────────────────────────────

/// # Safety
/// `client` must be a valid handle; `out_device` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_open_device(
    client: *mut Capella,
    out_device: *mut u64,
) -> c_int {
    CAPI_DEVICE.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "open_device").entered();
    if client.is_null() || out_device.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    *out_device = handle.client.open_device().get();
    CAPELLA_OK
}

/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_close_device(client: *mut Capella, device: u64) -> c_int {
    CAPI_DEVICE.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "close_device").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(device) = DeviceId::new(device) else {
        return fail(handle, &CapError::BadDevice);
    };
    match handle.client.close_device(device) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

// ── Containers ──────────────────────────────────────────────────────

/// # Safety
/// `client` must be a valid handle; `out_handle` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_container_create(
    client: *mut Capella,
    kind_code: u8,
    size: u64,
    out_handle: *mut u64,
) -> c_int {
    CAPI_CONTAINER.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "container_create").entered();
    if client.is_null() || out_handle.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(kind) = ElementKind::from_code(kind_code) else {
        return fail(
            handle,
            &CapError::invalid_param(format!("unknown element kind code {kind_code}")),
        );
    };
    *out_handle = handle.client.create_container(kind, size as usize).raw();
    CAPELLA_OK
}

/// Destroy a container. Null (zero) or stale handles are a no-op.
///
/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_container_destroy(client: *mut Capella, container: u64) -> c_int {
    CAPI_CONTAINER.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "container_destroy").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    if let Some(h) = ContainerHandle::from_raw(container) {
        handle.client.destroy_container(h);
    }
    CAPELLA_OK
}

/// # Safety
/// `client` must be a valid handle; `out_size` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_container_size(
    client: *const Capella,
    container: u64,
    out_size: *mut u64,
) -> c_int {
    CAPI_CONTAINER.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "container_size").entered();
    if client.is_null() || out_size.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.container_size(h) {
        Ok(n) => {
            *out_size = n as u64;
            CAPELLA_OK
        }
        Err(e) => fail(handle, &e),
    }
}

/// Element kind code of a live container.
///
/// # Safety
/// `client` must be a valid handle; `out_kind` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_container_kind(
    client: *const Capella,
    container: u64,
    out_kind: *mut u8,
) -> c_int {
    CAPI_CONTAINER.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "container_kind").entered();
    if client.is_null() || out_kind.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    match ContainerHandle::from_raw(container).and_then(|h| handle.client.container_kind(h)) {
        Some(kind) => {
            *out_kind = kind.code();
            CAPELLA_OK
        }
        None => fail(handle, &CapError::BadContainer),
    }
}

// ── Element access ──────────────────────────────────────────────────

/// # Safety
/// `client` must be a valid handle; `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_get_i32(
    client: *const Capella,
    container: u64,
    index: u64,
    out: *mut i32,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "get_i32").entered();
    if client.is_null() || out.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.get_element(h, index as usize) {
        Ok(CapValue::I32(v)) => {
            *out = v;
            CAPELLA_OK
        }
        Ok(v) => fail(
            handle,
            &CapError::mismatch(ElementKind::I32.name(), v.kind().name()),
        ),
        Err(e) => fail(handle, &e),
    }
}

/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_set_i32(
    client: *mut Capella,
    container: u64,
    index: u64,
    value: i32,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "set_i32").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.set_element(h, index as usize, CapValue::I32(value)) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

/// # Safety
/// `client` must be a valid handle; `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_get_f64(
    client: *const Capella,
    container: u64,
    index: u64,
    out: *mut f64,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "get_f64").entered();
    if client.is_null() || out.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.get_element(h, index as usize) {
        Ok(value) => match value.numeric() {
            Some(v) => {
                *out = v;
                CAPELLA_OK
            }
            None => fail(
                handle,
                &CapError::mismatch(ElementKind::F64.name(), value.kind().name()),
            ),
        },
        Err(e) => fail(handle, &e),
    }
}

/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_set_f64(
    client: *mut Capella,
    container: u64,
    index: u64,
    value: f64,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "set_f64").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.set_element(h, index as usize, CapValue::F64(value)) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

/// Copy a string element into `buf` as UTF-8 (always null-terminated,
/// truncated to fit). `out_len` receives the full untruncated length.
///
/// # Safety
/// `buf` must point to at least `buf_len` writable bytes; `out_len` may be
/// null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_get_string(
    client: *const Capella,
    container: u64,
    index: u64,
    buf: *mut c_char,
    buf_len: usize,
    out_len: *mut usize,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "get_string").entered();
    if client.is_null() || buf.is_null() || buf_len == 0 {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.get_element_string(h, index as usize) {
        Ok(s) => {
            let bytes = s.as_bytes();
            if !out_len.is_null() {
                *out_len = bytes.len();
            }
            let n = bytes.len().min(buf_len - 1);
            std::ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buf, n);
            *buf.add(n) = 0;
            CAPELLA_OK
        }
        Err(e) => fail(handle, &e),
    }
}

/// # Safety
/// `client` must be a valid handle; `s` must be a valid null-terminated
/// UTF-8 C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_set_string(
    client: *mut Capella,
    container: u64,
    index: u64,
    s: *const c_char,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "set_string").entered();
    if client.is_null() || s.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    let Ok(text) = CStr::from_ptr(s).to_str() else {
        return fail(handle, &CapError::invalid_param("string is not valid UTF-8"));
    };
    match handle.client.set_element_string(h, index as usize, text) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

/// Bulk-copy `len` numeric elements starting at `offset` into `out`,
/// widened to f64. The pointer-shaped bulk accessor for numeric kinds.
///
/// # Safety
/// `out` must point to at least `len` writable f64 slots.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_read_f64_bulk(
    client: *const Capella,
    container: u64,
    offset: u64,
    out: *mut f64,
    len: u64,
) -> c_int {
    CAPI_ELEMENT.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "read_f64_bulk").entered();
    if client.is_null() || out.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(container) else {
        return fail(handle, &CapError::BadContainer);
    };
    for i in 0..len as usize {
        match handle.client.get_element(h, offset as usize + i) {
            Ok(value) => match value.numeric() {
                Some(v) => *out.add(i) = v,
                None => {
                    return fail(
                        handle,
                        &CapError::mismatch(ElementKind::F64.name(), value.kind().name()),
                    );
                }
            },
            Err(e) => return fail(handle, &e),
        }
    }
    CAPELLA_OK
}

// ── Capability negotiation ──────────────────────────────────────────

fn parse_negotiation_args(
    op_code: u8,
    kind_bit: u8,
    ty_code: u8,
) -> Result<(OpClass, Option<ContainerKind>, Option<PrimitiveType>), CapError> {
    let op = OpClass::from_code(op_code)
        .ok_or_else(|| CapError::invalid_param(format!("unknown op class code {op_code}")))?;
    let kind = if kind_bit == CAPELLA_KIND_DEFAULT {
        None
    } else {
        Some(kind_from_bit(kind_bit).ok_or_else(|| {
            CapError::invalid_param(format!("unknown container kind bit {kind_bit}"))
        })?)
    };
    let ty = if ty_code == CAPELLA_TYPE_DEFAULT {
        None
    } else {
        Some(PrimitiveType::from_code(ty_code).ok_or_else(|| {
            CapError::invalid_param(format!("unknown primitive type code {ty_code}"))
        })?)
    };
    Ok((op, kind, ty))
}

/// Negotiate a capability read. On success `out_handle` receives a fresh
/// container the caller owns.
///
/// # Safety
/// `client` must be a valid handle; `out_handle` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_get_capability(
    client: *mut Capella,
    device: u64,
    cap: u16,
    op_code: u8,
    kind_bit: u8,
    ty_code: u8,
    out_handle: *mut u64,
) -> c_int {
    CAPI_CAPABILITY.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "get_capability").entered();
    if client.is_null() || out_handle.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(device) = DeviceId::new(device) else {
        return fail(handle, &CapError::BadDevice);
    };
    let (op, kind, ty) = match parse_negotiation_args(op_code, kind_bit, ty_code) {
        Ok(parsed) => parsed,
        Err(e) => return fail(handle, &e),
    };
    match handle
        .client
        .get_capability(device, CapId::new(cap), op, kind, ty)
    {
        Ok(h) => {
            *out_handle = h.raw();
            CAPELLA_OK
        }
        Err(e) => {
            *out_handle = 0;
            fail(handle, &e)
        }
    }
}

/// Negotiate a capability write from the payload container.
///
/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_set_capability(
    client: *mut Capella,
    device: u64,
    cap: u16,
    op_code: u8,
    kind_bit: u8,
    ty_code: u8,
    payload: u64,
) -> c_int {
    CAPI_CAPABILITY.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "set_capability").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(device) = DeviceId::new(device) else {
        return fail(handle, &CapError::BadDevice);
    };
    let Some(payload) = ContainerHandle::from_raw(payload) else {
        return fail(handle, &CapError::BadContainer);
    };
    let (op, kind, ty) = match parse_negotiation_args(op_code, kind_bit, ty_code) {
        Ok(parsed) => parsed,
        Err(e) => return fail(handle, &e),
    };
    match handle
        .client
        .set_capability(device, CapId::new(cap), op, kind, ty, payload)
    {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

/// Reset a capability to its device default.
///
/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_reset_capability(
    client: *mut Capella,
    device: u64,
    cap: u16,
    ty_code: u8,
) -> c_int {
    CAPI_CAPABILITY.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "reset_capability").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(device) = DeviceId::new(device) else {
        return fail(handle, &CapError::BadDevice);
    };
    let ty = if ty_code == CAPELLA_TYPE_DEFAULT {
        None
    } else {
        match PrimitiveType::from_code(ty_code) {
            Some(t) => Some(t),
            None => {
                return fail(
                    handle,
                    &CapError::invalid_param(format!("unknown primitive type code {ty_code}")),
                );
            }
        }
    };
    match handle.client.reset_capability(device, CapId::new(cap), ty) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}

// ── Ranges ──────────────────────────────────────────────────────────

/// # Safety
/// `client` must be a valid handle; `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_range_nearest(
    client: *const Capella,
    range: u64,
    input: f64,
    rounding_code: u8,
    out: *mut f64,
) -> c_int {
    CAPI_RANGE.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "range_nearest").entered();
    if client.is_null() || out.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(range) else {
        return fail(handle, &CapError::BadContainer);
    };
    let rounding = match rounding_code {
        0 => Rounding::Down,
        1 => Rounding::Up,
        2 => Rounding::Nearest,
        _ => {
            return fail(
                handle,
                &CapError::invalid_param(format!("unknown rounding code {rounding_code}")),
            );
        }
    };
    match handle.client.range_nearest(h, input, rounding) {
        Ok(v) => {
            *out = v;
            CAPELLA_OK
        }
        Err(e) => fail(handle, &e),
    }
}

/// # Safety
/// `client` must be a valid handle; `out_count` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_range_count(
    client: *const Capella,
    range: u64,
    out_count: *mut u64,
) -> c_int {
    CAPI_RANGE.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "range_count").entered();
    if client.is_null() || out_count.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(range) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.range_count(h) {
        Ok(n) => {
            *out_count = n;
            CAPELLA_OK
        }
        Err(e) => fail(handle, &e),
    }
}

/// Expand a range into a new flat container the caller owns.
///
/// # Safety
/// `client` must be a valid handle; `out_handle` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_range_expand(
    client: *mut Capella,
    range: u64,
    out_handle: *mut u64,
) -> c_int {
    CAPI_RANGE.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "range_expand").entered();
    if client.is_null() || out_handle.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(range) else {
        return fail(handle, &CapError::BadContainer);
    };
    match handle.client.range_expand(h) {
        Ok(flat) => {
            *out_handle = flat.raw();
            CAPELLA_OK
        }
        Err(e) => {
            *out_handle = 0;
            fail(handle, &e)
        }
    }
}

// ── Frames ──────────────────────────────────────────────────────────

/// # Safety
/// `client` must be a valid handle; `out_handle` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_frame_create(
    client: *mut Capella,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    out_handle: *mut u64,
) -> c_int {
    CAPI_FRAME.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "frame_create").entered();
    if client.is_null() || out_handle.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    *out_handle = handle.client.frame_create(left, top, right, bottom).raw();
    CAPELLA_OK
}

/// Read one frame component by slot index (0 = left, 1 = top, 2 = right,
/// 3 = bottom).
///
/// # Safety
/// `client` must be a valid handle; `out` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_frame_get(
    client: *const Capella,
    frame: u64,
    component: u8,
    out: *mut f64,
) -> c_int {
    CAPI_FRAME.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "frame_get").entered();
    if client.is_null() || out.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(frame) else {
        return fail(handle, &CapError::BadContainer);
    };
    let Some(which) = FrameComponent::from_index(component as usize) else {
        return fail(
            handle,
            &CapError::invalid_param(format!("frame slot {component}")),
        );
    };
    match handle.client.frame_get_component(h, which) {
        Ok(v) => {
            *out = v;
            CAPELLA_OK
        }
        Err(e) => fail(handle, &e),
    }
}

/// Write one frame component by slot index.
///
/// # Safety
/// `client` must be a valid handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn capella_frame_set(
    client: *mut Capella,
    frame: u64,
    component: u8,
    value: f64,
) -> c_int {
    CAPI_FRAME.fetch_add(1, Ordering::Relaxed);
    let _span = tracing::info_span!("capi", api_func = "frame_set").entered();
    if client.is_null() {
        return CAPELLA_MISUSE;
    }
    let handle = &*client;
    let Some(h) = ContainerHandle::from_raw(frame) else {
        return fail(handle, &CapError::BadContainer);
    };
    let Some(which) = FrameComponent::from_index(component as usize) else {
        return fail(
            handle,
            &CapError::invalid_param(format!("frame slot {component}")),
        );
    };
    match handle.client.frame_set_component(h, which, value) {
        Ok(()) => CAPELLA_OK,
        Err(e) => fail(handle, &e),
    }
}
