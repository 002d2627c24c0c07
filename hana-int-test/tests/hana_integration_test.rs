mod codec;
mod compiler;
mod dialect;
mod resolver;

#[ctor::ctor]
fn init() {
    colog::init();
}
