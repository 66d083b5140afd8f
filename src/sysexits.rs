//! Exit status codes returned by calibre-backup.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 64 <br>
/// `--library` or `--backup` was not given.
pub const EX_USAGE: i32 = 64;

/// value: 65 <br>
/// A manifest check found files whose content no longer matches.
pub const EX_DATAERR: i32 = 65;

/// value: 66 <br>
/// The library folder has no `metadata.db`, or there is no manifest to verify.
pub const EX_NOINPUT: i32 = 66;

/// value: 69 <br>
/// `calibre-debug` could not be found on the search path.
pub const EX_UNAVAILABLE: i32 = 69;

/// value: 70 <br>
/// `calibre-debug` ran but did not exit successfully.
pub const EX_SOFTWARE: i32 = 70;

/// value: 71 <br>
/// The runtime used for countdowns and Ctrl-C handling could not be started.
pub const EX_OSERR: i32 = 71;

/// value: 73 <br>
/// The backup folder is itself a calibre library and must not be written into.
pub const EX_CANTCREAT: i32 = 73;

/// value: 74 <br>
/// Reading, writing or deleting something on disk failed.
pub const EX_IOERR: i32 = 74;

/// value: 77 <br>
/// The backup folder is not empty and `--clean` was not given.
pub const EX_NOPERM: i32 = 77;

/// value: 78 <br>
/// The configuration file could not be read or parsed.
pub const EX_CONFIG: i32 = 78;

/// value: 130 <br>
/// Interrupted with Ctrl-C during a countdown (128 + SIGINT).
pub const EX_INTERRUPTED: i32 = 130;
