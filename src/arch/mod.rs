//! 架构相关实现

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m;

#[cfg(any(test, feature = "std"))]
pub mod host;
