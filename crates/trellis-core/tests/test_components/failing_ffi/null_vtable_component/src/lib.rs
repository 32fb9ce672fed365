use std::ffi::c_void;

// Right symbol, but it never hands out a vtable.
#[unsafe(no_mangle)]
pub extern "C" fn _trellis_component() -> *mut c_void {
    std::ptr::null_mut()
}
