// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Helper connection macros

pub use paste::paste;

#[macro_export]
/// Connect an [OutPort](ringlock_engine::port::OutPort) port to an
/// [InPort](ringlock_engine::port::InPort)
///
/// The `from` component must provide a `connect_port_<name>` function and the
/// `to` component a `port_<name>` function. Indexed ports use the `_i`
/// variants of those functions.
macro_rules! connect_port {
    ($from:expr, $from_port_name:ident => $to:expr, $to_port_name:ident) => {{
        ringlock_track::debug!($from.entity ; "Connect {}.{} => {}.{}", $from, stringify!($from_port_name), $to, stringify!($to_port_name));
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port_name >]($to.[< port_ $to_port_name >]())
        }
    }};
    ($from:expr, $from_port_name:ident => $to:expr, $to_port_name:ident, $to_index:expr) => {{
        let to_index: usize = $to_index;
        ringlock_track::debug!($from.entity ; "Connect {}.{} => {}.{}[{}]", $from, stringify!($from_port_name), $to, stringify!($to_port_name), to_index);
        $crate::connect::paste! {
            $from.[< connect_port_ $from_port_name >]($to.[< port_ $to_port_name _i >](to_index))
        }
    }};
}

#[macro_export]
/// Connect a tx port stored in a `RefCell<Option<>>`.
///
/// Once a component is running its ports have been taken and connecting
/// returns an error.
macro_rules! connect_tx {
    ($port:expr, $fn:ident ; $port_state:ident) => {
        match $port.borrow_mut().as_mut() {
            Some(port) => port.$fn($port_state),
            None => ringlock_engine::sim_error!("port already in use by a running component"),
        }
    };
}

#[macro_export]
/// Access the state of an rx port stored in a `RefCell<Option<>>`.
macro_rules! port_rx {
    ($port:expr, $fn:ident) => {
        match $port.borrow().as_ref() {
            Some(port) => port.$fn(),
            None => ringlock_engine::sim_error!("port already in use by a running component"),
        }
    };
}

#[macro_export]
/// Take a port out of a `RefCell<Option<>>` when a component starts running.
///
/// Evaluates to a `SimError` from the enclosing function if the port has
/// already been taken.
macro_rules! take_option {
    ($var:expr) => {
        match $var.borrow_mut().take() {
            Some(value) => value,
            None => return ringlock_engine::sim_error!("component run more than once"),
        }
    };
}
