fn main() {
    timelapse_lib::run()
}
