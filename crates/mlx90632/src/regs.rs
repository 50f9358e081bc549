//! Register and EEPROM map (datasheet 3901090632, rev 9).

/// Calibration version word; 0x0105 identifies a DSP v5 medical-grade part.
pub const EE_VERSION: u16 = 0x240B;
pub const EXPECTED_EE_VERSION: u16 = 0x0105;

// 32-bit ambient calibration constants, LSW first.
pub const EE_P_R: u16 = 0x240C;
pub const EE_P_G: u16 = 0x240E;
pub const EE_P_T: u16 = 0x2410;
pub const EE_P_O: u16 = 0x2412;

// 32-bit object calibration constants.
pub const EE_EA: u16 = 0x2424;
pub const EE_EB: u16 = 0x2426;
pub const EE_FA: u16 = 0x2428;
pub const EE_FB: u16 = 0x242A;
pub const EE_GA: u16 = 0x242C;

// 16-bit calibration constants.
pub const EE_GB: u16 = 0x242E;
pub const EE_KA: u16 = 0x242F;
pub const EE_HA: u16 = 0x2481;
pub const EE_HB: u16 = 0x2482;

pub const REG_CONTROL: u16 = 0x3001;
pub const CONTROL_MODE_SHIFT: u16 = 1;
pub const CONTROL_MODE_MASK: u16 = 0b11 << CONTROL_MODE_SHIFT;

pub const REG_STATUS: u16 = 0x3FFF;
pub const STATUS_NEW_DATA: u16 = 1 << 0;
pub const STATUS_CYCLE_SHIFT: u16 = 2;
pub const STATUS_CYCLE_MASK: u16 = 0b1_1111 << STATUS_CYCLE_SHIFT;

// Measurement RAM. RAM_4/RAM_5 and RAM_7/RAM_8 hold the object channels of
// the two alternating measurements; RAM_6/RAM_9 the ambient channels.
pub const RAM_4: u16 = 0x4003;
pub const RAM_5: u16 = 0x4004;
pub const RAM_6: u16 = 0x4005;
pub const RAM_7: u16 = 0x4006;
pub const RAM_8: u16 = 0x4007;
pub const RAM_9: u16 = 0x4008;
