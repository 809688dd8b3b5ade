/// DMR data packet.
pub const DMRD: &str = "DMRD";
/// DMR talker alias.
pub const DMRA: &str = "DMRA";

/// Master closing the connection.
pub const MSTCL: &str = "MSTCL";
/// Master rejecting a repeater.
pub const MSTNAK: &str = "MSTNAK";
/// Master answering a keepalive.
pub const MSTPONG: &str = "MSTPONG";
/// Master notice.
pub const MSTN: &str = "MSTN";
/// Master ping.
pub const MSTP: &str = "MSTP";
/// Master close request.
pub const MSTC: &str = "MSTC";

/// Repeater login request.
pub const RPTL: &str = "RPTL";
/// Repeater keepalive.
pub const RPTPING: &str = "RPTPING";
/// Repeater disconnecting.
pub const RPTCL: &str = "RPTCL";
/// Acknowledgement sent back to a repeater.
pub const RPTACK: &str = "RPTACK";
/// Login challenge response.
pub const RPTK: &str = "RPTK";
/// Repeater configuration (or disconnect, when followed by `L`).
pub const RPTC: &str = "RPTC";
/// Repeater ping.
pub const RPTP: &str = "RPTP";
/// Repeater talker alias.
pub const RPTA: &str = "RPTA";
/// Repeater options.
pub const RPTO: &str = "RPTO";
/// Repeater status.
pub const RPTS: &str = "RPTS";
/// Repeater beacon.
pub const RPTSBKN: &str = "RPTSBKN";

/// Every command token, longest first within a shared prefix so a datagram
/// can be matched with the first `starts_with` hit.
pub const ALL_COMMANDS: &[&str] = &[
    DMRD, DMRA, MSTCL, MSTNAK, MSTPONG, MSTN, MSTP, MSTC, RPTSBKN, RPTPING, RPTACK, RPTCL, RPTL,
    RPTK, RPTC, RPTP, RPTA, RPTO, RPTS,
];

/// The command a datagram starts with, if any.
pub fn command_of(packet: &[u8]) -> Option<&'static str> {
    ALL_COMMANDS
        .iter()
        .copied()
        .find(|command| packet.starts_with(command.as_bytes()))
}
