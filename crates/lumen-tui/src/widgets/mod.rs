pub mod brightness_bar;
