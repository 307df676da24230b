/// Wet Bulb Globe Temperature approximated from the heat index
/// Source: Bernard, T.E.; Iheanacho, I. Heat index and adjusted temperature as surrogates for
/// wet bulb globe temperature to screen for occupational heat stress. J Occup Environ Hyg 2015.
pub mod functions;
