use vend_core::gpio::MemoryBank;
use vend_core::relay::PinBank;
use vend_core::Result;

/// The relay bank every command drives: the GPIO header, or an in-memory
/// bank when `simulate` is set.
pub fn open_bank(simulate: bool) -> Result<Box<dyn PinBank>> {
    if simulate {
        tracing::info!("simulating relay outputs; no GPIO pins will be driven");
        return Ok(Box::new(MemoryBank::new()));
    }
    open_gpio()
}

#[cfg(feature = "rpi")]
fn open_gpio() -> Result<Box<dyn PinBank>> {
    Ok(Box::new(vend_core::gpio::RppalBank::open()?))
}

#[cfg(not(feature = "rpi"))]
fn open_gpio() -> Result<Box<dyn PinBank>> {
    Err(vend_core::VendError::HardwareInit(
        "no GPIO support in this build (rebuild with --features rpi, or pass --simulate)".into(),
    ))
}
