//! Enumerated attribute values for RADIUS accounting (RFC 2866).
//!
//! These are the values hosts place into Acct-Status-Type,
//! Acct-Terminate-Cause and Acct-Authentic attributes; each converts into an
//! [`AttributeValue::Integer`] for use with [`Packet::add_attribute`].
//!
//! [`Packet::add_attribute`]: crate::packet::Packet::add_attribute

use crate::attributes::AttributeValue;

/// Acct-Status-Type values (RFC 2866 Section 5.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctStatusType {
    /// Start (1) - session has begun
    Start = 1,
    /// Stop (2) - session has ended
    Stop = 2,
    /// Interim-Update (3) - periodic update during a session
    InterimUpdate = 3,
    /// Accounting-On (7) - NAS is ready to accept requests
    AccountingOn = 7,
    /// Accounting-Off (8) - NAS is shutting down
    AccountingOff = 8,
}

impl AcctStatusType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AcctStatusType::Start),
            2 => Some(AcctStatusType::Stop),
            3 => Some(AcctStatusType::InterimUpdate),
            7 => Some(AcctStatusType::AccountingOn),
            8 => Some(AcctStatusType::AccountingOff),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Acct-Terminate-Cause values (RFC 2866 Section 5.10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctTerminateCause {
    UserRequest = 1,
    LostCarrier = 2,
    LostService = 3,
    IdleTimeout = 4,
    SessionTimeout = 5,
    AdminReset = 6,
    AdminReboot = 7,
    PortError = 8,
    NasError = 9,
    NasRequest = 10,
    NasReboot = 11,
    PortUnneeded = 12,
    PortPreempted = 13,
    PortSuspended = 14,
    ServiceUnavailable = 15,
    Callback = 16,
    UserError = 17,
    HostRequest = 18,
}

impl AcctTerminateCause {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AcctTerminateCause::UserRequest),
            2 => Some(AcctTerminateCause::LostCarrier),
            3 => Some(AcctTerminateCause::LostService),
            4 => Some(AcctTerminateCause::IdleTimeout),
            5 => Some(AcctTerminateCause::SessionTimeout),
            6 => Some(AcctTerminateCause::AdminReset),
            7 => Some(AcctTerminateCause::AdminReboot),
            8 => Some(AcctTerminateCause::PortError),
            9 => Some(AcctTerminateCause::NasError),
            10 => Some(AcctTerminateCause::NasRequest),
            11 => Some(AcctTerminateCause::NasReboot),
            12 => Some(AcctTerminateCause::PortUnneeded),
            13 => Some(AcctTerminateCause::PortPreempted),
            14 => Some(AcctTerminateCause::PortSuspended),
            15 => Some(AcctTerminateCause::ServiceUnavailable),
            16 => Some(AcctTerminateCause::Callback),
            17 => Some(AcctTerminateCause::UserError),
            18 => Some(AcctTerminateCause::HostRequest),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Acct-Authentic values (RFC 2866 Section 5.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctAuthentic {
    /// RADIUS (1)
    Radius = 1,
    /// Local (2)
    Local = 2,
    /// Remote (3)
    Remote = 3,
}

impl AcctAuthentic {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AcctAuthentic::Radius),
            2 => Some(AcctAuthentic::Local),
            3 => Some(AcctAuthentic::Remote),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl From<AcctStatusType> for AttributeValue {
    fn from(value: AcctStatusType) -> Self {
        AttributeValue::Integer(value.as_u32())
    }
}

impl From<AcctTerminateCause> for AttributeValue {
    fn from(value: AcctTerminateCause) -> Self {
        AttributeValue::Integer(value.as_u32())
    }
}

impl From<AcctAuthentic> for AttributeValue {
    fn from(value: AcctAuthentic) -> Self {
        AttributeValue::Integer(value.as_u32())
    }
}
