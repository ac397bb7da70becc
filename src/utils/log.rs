use core::fmt::{self, Write};

// 日志级别定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[allow(dead_code)]
pub enum LogLevel {
    Emergency = 0, // LOS_EMG_LEVEL
    Common = 1,    // LOS_COMMOM_LEVEL
    Error = 2,     // LOS_ERR_LEVEL
    Warning = 3,   // LOS_WARN_LEVEL
    Info = 4,      // LOS_INFO_LEVEL
    Debug = 5,     // LOS_DEBUG_LEVEL
}

// 编译时日志级别配置，同时开启多个级别时取最详细的一个
pub const PRINT_LEVEL: LogLevel = if cfg!(feature = "log-debug") {
    LogLevel::Debug
} else if cfg!(feature = "log-info") {
    LogLevel::Info
} else if cfg!(feature = "log-warning") {
    LogLevel::Warning
} else if cfg!(feature = "log-error") {
    LogLevel::Error
} else if cfg!(feature = "log-common") {
    LogLevel::Common
} else if cfg!(feature = "log-emergency") {
    LogLevel::Emergency
} else {
    // 默认级别（如果没有指定任何feature）
    LogLevel::Error
};

// 日志级别前缀
const LOG_PREFIXES: &[&str] = &["[EMG] ", "", "[ERR] ", "[WARN] ", "[INFO] ", "[DEBUG] "];

/// 日志输出
fn write_out(message: &str) {
    #[cfg(feature = "semihosting")]
    semihosting::print!("{}", message);

    #[cfg(all(not(feature = "semihosting"), any(test, feature = "std")))]
    std::eprint!("{}", message);

    #[cfg(all(not(feature = "semihosting"), not(any(test, feature = "std"))))]
    let _ = message;
}

#[doc(hidden)]
pub fn _print_internal(prefix: &str, args: fmt::Arguments) {
    // 使用heapless::String避免堆分配
    let mut message = heapless::String::<512>::new();
    if write!(message, "{}{}", prefix, args).is_ok() {
        write_out(&message);
    } else {
        // 格式化失败，输出错误消息
        write_out("Log message too long or format error\n");
    }
}

/// 当前配置下该级别是否会输出
#[inline]
pub const fn enabled(level: LogLevel) -> bool {
    level as u8 <= PRINT_LEVEL as u8
}

// 带前缀的日志打印函数
pub fn log_with_prefix(level: LogLevel, args: fmt::Arguments) {
    if enabled(level) {
        let prefix = LOG_PREFIXES[level as usize];
        _print_internal(prefix, args);
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($level:ident;) => {
        $crate::utils::log::log_with_prefix(
            $crate::utils::log::LogLevel::$level,
            format_args!("\n"),
        )
    };
    ($level:ident; $($arg:tt)+) => {
        $crate::utils::log::log_with_prefix(
            $crate::utils::log::LogLevel::$level,
            format_args!("{}\n", format_args!($($arg)*)),
        )
    };
}

#[macro_export]
macro_rules! println_common {
    ($($arg:tt)*) => { $crate::__log_line!(Common; $($arg)*) };
}

#[macro_export]
macro_rules! println_error {
    ($($arg:tt)*) => { $crate::__log_line!(Error; $($arg)*) };
}

#[macro_export]
macro_rules! println_warning {
    ($($arg:tt)*) => { $crate::__log_line!(Warning; $($arg)*) };
}

#[macro_export]
macro_rules! println_info {
    ($($arg:tt)*) => { $crate::__log_line!(Info; $($arg)*) };
}

#[macro_export]
macro_rules! println_debug {
    ($($arg:tt)*) => { $crate::__log_line!(Debug; $($arg)*) };
}
