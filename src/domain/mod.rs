// Domain layer - Plain data and the rules that apply to it
pub mod status;
pub mod time_series;
pub mod variable;
